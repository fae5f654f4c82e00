use std::{collections::BTreeMap, path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use paycheck::{
    auth::{mask_headers, TokenStore},
    catalog::{load_environments, EnvironmentDefinition},
    clock::{system_clock, Clock},
    config::{credentials_from_env, prefix_mapping, Settings},
    env::load_environment,
    printer::print_report,
    runner::{RunReport, TestRunner},
    scenario::{PaymentOverride, ScenarioParams},
};

#[derive(Parser, Debug)]
#[command(
    name = "paycheck",
    version,
    about = "Catalog-driven API test runner with OAuth2 client credentials",
    disable_help_subcommand = true
)]
struct Cli {
    /// Path to environments.json (overrides ENVIRONMENTS_FILE)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Load variables from this .env file instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List configured environments
    Envs,
    /// List the test cases of an environment
    List {
        #[arg(short, long)]
        env: String,
    },
    /// Run one test case
    Run {
        #[arg(value_name = "TEST_ID")]
        test_id: String,
        #[arg(short, long)]
        env: String,
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run every test case of an environment
    RunAll {
        #[arg(short, long)]
        env: String,
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Force a token refresh and show its expiry
    Token {
        #[arg(short, long)]
        env: String,
    },
    /// Show effective settings and credential status
    Settings,
    /// Preview the headers a request would carry, credentials masked
    Headers {
        #[arg(short, long)]
        env: String,
        /// Caller header as `name=value` or `name: value` (repeatable)
        #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header_arg)]
        headers: Vec<(String, String)>,
        /// Leave out the bearer token
        #[arg(long)]
        no_bearer: bool,
    },
}

fn parse_header_arg(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .find([':', '='])
        .map(|at| (&raw[..at], &raw[at + 1..]))
        .ok_or_else(|| format!("expected name=value or name: value, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[derive(Args, Debug, Default)]
struct OutputArgs {
    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Preview the first N bytes of each response body
    #[arg(short, long)]
    preview: Option<usize>,
}

#[derive(Args, Debug, Default)]
struct ScenarioArgs {
    #[arg(long)]
    auto_payment_account: Option<String>,
    #[arg(long)]
    auto_payment_type: Option<String>,
    #[arg(long)]
    make_payment_account: Option<String>,
    #[arg(long)]
    make_payment_type: Option<String>,
    /// Comma-separated payment ids for cancel tests
    #[arg(long)]
    cancel_ids: Option<String>,
    /// Comma-separated payment ids for receipt tests
    #[arg(long)]
    receipt_ids: Option<String>,
    /// Comma-separated payment ids for status tests
    #[arg(long)]
    status_ids: Option<String>,
    /// Run once per payment account id
    #[arg(long)]
    payment_account_ids: Option<String>,
    /// Run once per scheduled payment id
    #[arg(long)]
    scheduled_payment_ids: Option<String>,
}

impl ScenarioArgs {
    fn into_params(self) -> ScenarioParams {
        let payment_override = |account: Option<String>, kind: Option<String>| {
            let config = PaymentOverride {
                payment_account_id: account,
                payment_type_id: kind,
            };
            (!config.is_empty()).then_some(config)
        };

        ScenarioParams {
            auto_payment: payment_override(self.auto_payment_account, self.auto_payment_type),
            make_payment: payment_override(self.make_payment_account, self.make_payment_type),
            cancel_payment_ids: self.cancel_ids,
            receipt_payment_ids: self.receipt_ids,
            status_payment_ids: self.status_ids,
            payment_account_ids: self.payment_account_ids,
            scheduled_payment_ids: self.scheduled_payment_ids,
        }
    }
}

fn log_filter(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

fn init_tracing(verbose: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

struct App {
    settings: Settings,
    tokens: Arc<TokenStore>,
    runner: TestRunner,
}

async fn build_app(cli: &Cli, clock: Arc<dyn Clock>) -> Result<App> {
    let env = load_environment(cli.env_file.as_deref())?;
    let mut settings = Settings::from_env(&env).context("reading settings")?;
    if let Some(path) = &cli.config {
        settings.environments_file = path.clone();
    }

    let definitions: Vec<EnvironmentDefinition> =
        match load_environments(&settings.environments_file).await {
            Ok(definitions) => definitions,
            Err(err) if matches!(cli.command, Commands::Settings) => {
                warn!("{err:#}");
                Vec::new()
            }
            Err(err) => return Err(err),
        };

    let credentials = credentials_from_env(&env, &prefix_mapping(&definitions));
    let tokens = Arc::new(TokenStore::new(credentials, clock.clone()));
    let runner = TestRunner::from_settings(&settings, tokens.clone(), clock);

    Ok(App {
        settings,
        tokens,
        runner,
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let app = build_app(&cli, system_clock()).await?;

    match cli.command {
        Commands::Envs => {
            for environment in app.runner.list_environments().await? {
                println!(
                    "{} {}",
                    environment.id.bold(),
                    environment.display_name().dimmed()
                );
                if let Some(description) = &environment.description {
                    println!("  {description}");
                }
            }
        }
        Commands::List { env } => {
            let catalog = app.runner.list_test_cases(&env).await?;
            println!("{} {}", "Base URL:".bold(), catalog.base_url.cyan());
            for test_case in &catalog.test_cases {
                let scenarios = test_case
                    .bodies
                    .as_ref()
                    .map(|bodies| format!(" ({} scenarios)", bodies.len()))
                    .unwrap_or_default();
                println!(
                    "{} {} {} {}{}",
                    test_case.id.bold(),
                    test_case.method.to_uppercase().cyan(),
                    test_case.endpoint,
                    format!("{} · {}", test_case.name, test_case.category()).dimmed(),
                    scenarios.dimmed()
                );
            }
        }
        Commands::Run {
            test_id,
            env,
            scenario,
            output,
        } => {
            let report = app
                .runner
                .run_one(&test_id, &env, &scenario.into_params())
                .await?;
            return emit_report(&report, &output);
        }
        Commands::RunAll {
            env,
            scenario,
            output,
        } => {
            let report = app.runner.run_all(&env, &scenario.into_params()).await?;
            return emit_report(&report, &output);
        }
        Commands::Token { env } => {
            if !app.tokens.oauth2_enabled(&env) {
                bail!("OAuth2 is not configured for environment {env}");
            }
            let info = app.tokens.refresh(&env).await?;
            let expires = DateTime::from_timestamp(info.expires_at, 0)
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| info.expires_at.to_string());
            println!(
                "{} {} {}",
                "Token refreshed for".green(),
                env.bold(),
                format!("(expires_in {} s, reusable until {expires})", info.expires_in).dimmed()
            );
        }
        Commands::Settings => {
            print_settings(&app).await;
        }
        Commands::Headers {
            env,
            headers,
            no_bearer,
        } => {
            let caller: BTreeMap<String, String> = headers.into_iter().collect();
            let composed = app
                .runner
                .executor()
                .headers()
                .compose(&caller, !no_bearer, &env)
                .await;
            for (name, value) in mask_headers(&composed) {
                println!("{}: {}", name.cyan(), value);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn emit_report(report: &RunReport, output: &OutputArgs) -> Result<ExitCode> {
    if output.json {
        let rendered = serde_json::to_string_pretty(report).context("serializing report")?;
        println!("{rendered}");
    } else {
        print_report(report, output.preview);
        if report.status_code() == 403 {
            println!("{}", "Request blocked by production safety check".red());
        }
    }

    if report.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn print_settings(app: &App) {
    let settings = &app.settings;
    println!(
        "{} {}",
        "Environments file:".bold(),
        settings.environments_file.display()
    );
    println!(
        "{} {} s",
        "Request timeout:".bold(),
        settings.request_timeout.as_secs()
    );
    println!(
        "{} {} {}",
        "Max retries:".bold(),
        settings.max_retries,
        "(not used)".dimmed()
    );
    println!("{}", "Default headers".bold());
    for (name, value) in settings.default_headers.entries() {
        println!("  {}: {}", name.cyan(), value.dimmed());
    }

    println!("{}", "Credentials".bold());
    for environment_id in app.tokens.environments() {
        let Some(status) = app.tokens.status(environment_id).await else {
            continue;
        };
        let oauth = if status.oauth2_enabled {
            "oauth2".green()
        } else {
            "oauth2 off".yellow()
        };
        let api_key = if status.has_api_key {
            "api key".green()
        } else {
            "no api key".dimmed()
        };
        println!("  {} {} {}", status.environment_id.bold(), oauth, api_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scenario_flags_build_params() {
        let cli = Cli::try_parse_from([
            "paycheck",
            "run",
            "add-auto-payment",
            "-e",
            "rapid-stage",
            "--auto-payment-account",
            "12",
            "--cancel-ids",
            "1,2",
            "--payment-account-ids",
            "10, 11",
        ])
        .unwrap();

        let Commands::Run {
            test_id,
            env,
            scenario,
            output,
        } = cli.command
        else {
            panic!("expected run command");
        };
        assert_eq!(test_id, "add-auto-payment");
        assert_eq!(env, "rapid-stage");
        assert!(!output.json);

        let params = scenario.into_params();
        assert_eq!(
            params.auto_payment,
            Some(PaymentOverride {
                payment_account_id: Some("12".to_string()),
                payment_type_id: None,
            })
        );
        assert_eq!(params.make_payment, None);
        assert_eq!(params.cancel_payment_ids.as_deref(), Some("1,2"));
        assert_eq!(params.payment_account_ids.as_deref(), Some("10, 11"));
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from([
            "paycheck",
            "run-all",
            "-e",
            "rapid-prod",
            "--json",
            "--config",
            "fixtures/environments.json",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("fixtures/environments.json")));
        assert!(matches!(
            cli.command,
            Commands::RunAll { ref output, .. } if output.json
        ));
    }

    #[test]
    fn header_flags_accept_both_separators() {
        let cli = Cli::try_parse_from([
            "paycheck",
            "headers",
            "-e",
            "rapid-stage",
            "-H",
            "X-Trace: abc",
            "--header",
            "x-api-key=override",
        ])
        .unwrap();

        let Commands::Headers {
            env,
            headers,
            no_bearer,
        } = cli.command
        else {
            panic!("expected headers command");
        };
        assert_eq!(env, "rapid-stage");
        assert!(!no_bearer);
        assert_eq!(
            headers,
            vec![
                ("X-Trace".to_string(), "abc".to_string()),
                ("x-api-key".to_string(), "override".to_string()),
            ]
        );
        assert_eq!(
            parse_header_arg("Authorization=Bearer a:b").unwrap(),
            ("Authorization".to_string(), "Bearer a:b".to_string())
        );
        assert!(parse_header_arg("no-separator").is_err());
        assert!(parse_header_arg(": value").is_err());
    }

    #[test]
    fn environment_is_required_for_runs() {
        assert!(Cli::try_parse_from(["paycheck", "run", "tc-1"]).is_err());
    }
}
