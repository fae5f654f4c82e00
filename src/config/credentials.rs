use tracing::{info, warn};

use crate::auth::{EnvironmentCredentials, OAuth2Config};
use crate::catalog::EnvironmentDefinition;
use crate::env::{lookup, EnvMap};

/// Built-in environment id → variable prefix mapping.
pub const DEFAULT_ENVIRONMENT_PREFIXES: &[(&str, &str)] = &[
    ("capricorn-trunk", "TRUNK"),
    ("rapid-prod", "RAPID_PROD"),
    ("standard-prod", "STANDARD_PROD"),
    ("rapid-stage", "RAPID_STAGE"),
    ("standard-stage", "STANDARD_STAGE"),
    ("external-local", "EXTERNAL_LOCAL"),
];

/// Default prefixes, overridden or extended by `env_prefix` on environment
/// definitions.
pub fn prefix_mapping(environments: &[EnvironmentDefinition]) -> Vec<(String, String)> {
    let mut mapping: Vec<(String, String)> = DEFAULT_ENVIRONMENT_PREFIXES
        .iter()
        .map(|(id, prefix)| (id.to_string(), prefix.to_string()))
        .collect();

    for env in environments {
        let Some(prefix) = env.env_prefix.as_deref().filter(|p| !p.is_empty()) else {
            continue;
        };
        match mapping.iter_mut().find(|(id, _)| id == &env.id) {
            Some(entry) => entry.1 = prefix.to_string(),
            None => mapping.push((env.id.clone(), prefix.to_string())),
        }
    }

    mapping
}

/// Reads `{PREFIX}_TOKEN_URL`, `_CLIENT_ID`, `_CLIENT_SECRET`, `_OAUTH_SCOPE`
/// and `_API_KEY` for every mapped environment. OAuth2 is enabled only when
/// the URL, id and secret are all present.
pub fn credentials_from_env(
    env: &EnvMap,
    mapping: &[(String, String)],
) -> Vec<EnvironmentCredentials> {
    mapping
        .iter()
        .map(|(environment_id, prefix)| {
            let token_url = lookup(env, &format!("{prefix}_TOKEN_URL"));
            let client_id = lookup(env, &format!("{prefix}_CLIENT_ID"));
            let client_secret = lookup(env, &format!("{prefix}_CLIENT_SECRET"));
            let scope = lookup(env, &format!("{prefix}_OAUTH_SCOPE"));
            let api_key = lookup(env, &format!("{prefix}_API_KEY"));

            let enabled = token_url.is_some() && client_id.is_some() && client_secret.is_some();
            if enabled {
                info!(environment = %environment_id, "loaded OAuth2 config from {prefix}_*");
            } else {
                warn!(environment = %environment_id, "missing OAuth2 variables ({prefix}_*)");
            }
            if api_key.is_some() {
                info!(environment = %environment_id, "loaded API key from {prefix}_API_KEY");
            }

            EnvironmentCredentials {
                environment_id: environment_id.clone(),
                oauth2: OAuth2Config {
                    enabled,
                    token_url: token_url.unwrap_or_default(),
                    client_id: client_id.unwrap_or_default(),
                    client_secret: client_secret.unwrap_or_default(),
                    scope,
                    ..OAuth2Config::default()
                },
                api_key,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn oauth_enabled_only_with_complete_settings() {
        let mapping = prefix_mapping(&[]);
        let creds = credentials_from_env(
            &env(&[
                ("RAPID_PROD_TOKEN_URL", "https://auth.example.com/token"),
                ("RAPID_PROD_CLIENT_ID", "client"),
                ("RAPID_PROD_CLIENT_SECRET", "secret"),
                ("RAPID_PROD_OAUTH_SCOPE", "payments"),
                ("RAPID_STAGE_TOKEN_URL", "https://auth.example.com/token"),
                ("RAPID_STAGE_API_KEY", "stage-key"),
            ]),
            &mapping,
        );

        assert_eq!(creds.len(), DEFAULT_ENVIRONMENT_PREFIXES.len());

        let prod = creds
            .iter()
            .find(|c| c.environment_id == "rapid-prod")
            .unwrap();
        assert!(prod.oauth2.enabled);
        assert_eq!(prod.oauth2.grant_type, "client_credentials");
        assert_eq!(prod.oauth2.scope.as_deref(), Some("payments"));
        assert_eq!(prod.api_key, None);

        let stage = creds
            .iter()
            .find(|c| c.environment_id == "rapid-stage")
            .unwrap();
        assert!(!stage.oauth2.enabled);
        assert_eq!(stage.api_key.as_deref(), Some("stage-key"));
    }

    #[test]
    fn environment_definitions_override_prefixes() {
        let defs: Vec<EnvironmentDefinition> = serde_json::from_value(json!([
            {"id": "rapid-prod", "test_cases_file": "a.json", "env_prefix": "RP"},
            {"id": "sandbox", "test_cases_file": "b.json", "env_prefix": "SANDBOX"},
            {"id": "external-local", "test_cases_file": "c.json"}
        ]))
        .unwrap();

        let mapping = prefix_mapping(&defs);
        assert!(mapping.contains(&("rapid-prod".to_string(), "RP".to_string())));
        assert!(mapping.contains(&("sandbox".to_string(), "SANDBOX".to_string())));
        assert!(mapping.contains(&("external-local".to_string(), "EXTERNAL_LOCAL".to_string())));
        assert_eq!(mapping.len(), DEFAULT_ENVIRONMENT_PREFIXES.len() + 1);
    }
}
