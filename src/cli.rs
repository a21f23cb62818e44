//! # SVCHARNESS CLI
//!
//! Command-line interface for the Service lifecycle harness.
//!
//! Renders fixtures, inspects live Services through the existence oracle, confirms
//! that previously tracked Services are gone, and runs the scenario catalog against
//! the in-memory cluster.
//!
//! ## Usage
//!
//! ```bash
//! # Render a fixture as a configuration block
//! svcharness render basic --name my-service
//!
//! # Render the same fixture as the API object it converges to
//! svcharness render load-balancer --name my-service --format manifest
//!
//! # Snapshot a live Service
//! svcharness inspect default/my-service
//!
//! # Confirm Services are gone
//! svcharness confirm-destroyed default/one default/two --lenient
//!
//! # Run the scenario catalog against the in-memory cluster
//! svcharness run-simulated --scenario basic
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kube::Client;
use service_lifecycle_harness::config::load_config;
use service_lifecycle_harness::constants::{DEFAULT_HEALTHCHECK_NODE_PORT, SERVICE_RESOURCE_KIND};
use service_lifecycle_harness::fixture::{variants, ServiceFixture};
use service_lifecycle_harness::observability::metrics;
use service_lifecycle_harness::oracle::{DestroyCheckMode, KubeServiceLookup, ServiceOracle};
use service_lifecycle_harness::resource::flatten;
use service_lifecycle_harness::scenario::{catalog, ScenarioOutcome};
use service_lifecycle_harness::simulated::simulated_runner;
use service_lifecycle_harness::state::TrackedState;
use service_lifecycle_harness::{HarnessConfig, ResourceIdentity};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "svcharness")]
#[command(about = "Lifecycle verification harness for Kubernetes Services", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Namespace for fixtures that do not set one (overrides HARNESS_NAMESPACE)
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Print the harness metrics in Prometheus text format when done
    #[arg(long, global = true)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a fixture variant
    Render {
        /// Fixture variant
        #[arg(value_enum)]
        variant: Variant,

        /// Resource name (or generate-name prefix); random when omitted
        #[arg(long)]
        name: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Config)]
        format: Format,

        /// Health-check node port for the load-balancer-healthcheck variant
        #[arg(long, default_value_t = DEFAULT_HEALTHCHECK_NODE_PORT)]
        node_port: i32,

        /// Provider alias for the regression and state-upgrade variants
        #[arg(long)]
        provider: Option<String>,
    },
    /// Snapshot a live Service by `namespace/name`
    Inspect {
        /// Service identifier, `namespace/name`
        id: String,
    },
    /// Confirm that Services no longer exist
    ConfirmDestroyed {
        /// Service identifiers, `namespace/name`
        #[arg(required = true)]
        ids: Vec<String>,

        /// Treat lookup failures other than not-found as destroyed
        #[arg(long)]
        lenient: bool,
    },
    /// Run catalog scenarios against the in-memory cluster
    RunSimulated {
        /// Run only this scenario
        #[arg(long)]
        scenario: Option<String>,

        /// Pretend the cluster cannot provision load balancers
        #[arg(long)]
        no_load_balancers: bool,

        /// Print one JSON report per scenario instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    Basic,
    Modified,
    LoadBalancer,
    LoadBalancerModified,
    LoadBalancerAnnotationsAws,
    LoadBalancerAnnotationsAwsModified,
    LoadBalancerHealthcheck,
    NodePort,
    StringTargetPort,
    NoTargetPort,
    ExternalName,
    GeneratedName,
    Regression,
    StateUpgradeV0,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Declarative configuration block
    Config,
    /// YAML API object
    Manifest,
}

#[tokio::main]
async fn main() -> Result<()> {
    // kube's rustls-tls feature needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        return Err(anyhow!("Failed to install rustls crypto provider"));
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "service_lifecycle_harness=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = load_config();
    if let Some(namespace) = cli.namespace {
        config.namespace = namespace;
    }
    metrics::register_metrics().context("Failed to register metrics")?;

    match cli.command {
        Commands::Render {
            variant,
            name,
            format,
            node_port,
            provider,
        } => render_command(&config, variant, name, format, node_port, provider),
        Commands::Inspect { id } => inspect_command(&id).await,
        Commands::ConfirmDestroyed { ids, lenient } => {
            confirm_destroyed_command(&config, &ids, lenient).await
        }
        Commands::RunSimulated {
            scenario,
            no_load_balancers,
            json,
        } => {
            if no_load_balancers {
                config.load_balancers_available = false;
            }
            run_simulated_command(&config, scenario.as_deref(), json).await
        }
    }?;

    if cli.metrics {
        println!("\n{}", metrics::gather_text()?);
    }
    Ok(())
}

fn build_fixture(
    config: &HarnessConfig,
    variant: Variant,
    name: &str,
    node_port: i32,
    provider: Option<String>,
) -> ServiceFixture {
    let provider = provider.unwrap_or_else(|| config.local_provider.clone());
    match variant {
        Variant::Basic => variants::basic(name),
        Variant::Modified => variants::modified(name),
        Variant::LoadBalancer => variants::load_balancer(name),
        Variant::LoadBalancerModified => variants::load_balancer_modified(name),
        Variant::LoadBalancerAnnotationsAws => variants::load_balancer_annotations_aws(name),
        Variant::LoadBalancerAnnotationsAwsModified => {
            variants::load_balancer_annotations_aws_modified(name)
        }
        Variant::LoadBalancerHealthcheck => variants::load_balancer_healthcheck(name, node_port),
        Variant::NodePort => variants::node_port(name),
        Variant::StringTargetPort => variants::string_target_port(name),
        Variant::NoTargetPort => variants::no_target_port(name),
        Variant::ExternalName => variants::external_name(name),
        Variant::GeneratedName => variants::generated_name(name),
        Variant::Regression => variants::regression(&provider, name),
        Variant::StateUpgradeV0 => variants::state_upgrade_v0(&provider, name),
    }
}

/// Print a fixture as configuration text or as the API object it converges to
fn render_command(
    config: &HarnessConfig,
    variant: Variant,
    name: Option<String>,
    format: Format,
    node_port: i32,
    provider: Option<String>,
) -> Result<()> {
    let name = name.unwrap_or_else(|| config.random_name());
    let fixture = build_fixture(config, variant, &name, node_port, provider);

    match format {
        Format::Config => print!("{}", fixture.render()),
        Format::Manifest => {
            let manifest = fixture.to_manifest(&config.namespace);
            let yaml = serde_yaml::to_string(&manifest).context("Failed to serialize manifest")?;
            print!("{yaml}");
        }
    }
    Ok(())
}

/// Snapshot a live Service and print its flattened attributes
async fn inspect_command(id: &str) -> Result<()> {
    let identity = ResourceIdentity::parse(id)?;
    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;
    let oracle = ServiceOracle::new(
        Arc::new(KubeServiceLookup::new(client)),
        DestroyCheckMode::Strict,
    );

    let observed = oracle
        .exists(&identity)
        .await
        .with_context(|| format!("Service '{identity}' is not available"))?;

    println!("Service '{identity}' (uid {}):\n", observed.uid());
    for (key, value) in flatten(&observed) {
        println!("  {key:<50} = {value}");
    }
    Ok(())
}

/// Confirm that every listed Service is gone
async fn confirm_destroyed_command(
    config: &HarnessConfig,
    ids: &[String],
    lenient: bool,
) -> Result<()> {
    let state = TrackedState::from_ids(ids.iter().enumerate().map(|(index, id)| {
        (
            format!("{SERVICE_RESOURCE_KIND}.arg{index}"),
            SERVICE_RESOURCE_KIND,
            id.as_str(),
        )
    }));

    let mode = if lenient {
        DestroyCheckMode::Lenient
    } else {
        config.destroy_check_mode()
    };
    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;
    let oracle = ServiceOracle::new(Arc::new(KubeServiceLookup::new(client)), mode);

    oracle.confirm_destroyed(&state).await?;
    println!("✅ {} Service(s) confirmed destroyed", ids.len());
    Ok(())
}

/// Run catalog scenarios against the in-memory cluster
async fn run_simulated_command(
    config: &HarnessConfig,
    scenario: Option<&str>,
    json: bool,
) -> Result<()> {
    let scenarios = match scenario {
        Some(name) => vec![catalog::by_name(name, config).ok_or_else(|| {
            anyhow!(
                "Unknown scenario '{name}'. Known: {}",
                catalog::SCENARIO_NAMES.join(", ")
            )
        })?],
        None => catalog::all(config),
    };

    let (runner, cluster) = simulated_runner(config);

    if !json {
        println!("\n{:<42} {:<10} {:<8} {:<10}", "SCENARIO", "OUTCOME", "STEPS", "MILLIS");
        println!("{}", "-".repeat(72));
    }

    let mut failures = 0_usize;
    for scenario in &scenarios {
        match runner.run(scenario).await {
            Ok(report) if json => {
                println!(
                    "{}",
                    serde_json::to_string(&report).context("Failed to serialize report")?
                );
            }
            Ok(report) => {
                println!(
                    "{:<42} {:<10} {:<8} {:<10}",
                    report.name,
                    report.outcome.as_str(),
                    report.steps_run,
                    report.duration_ms
                );
                if let ScenarioOutcome::Skipped(reason) = &report.outcome {
                    println!("    {reason}");
                }
            }
            Err(e) => {
                failures += 1;
                if json {
                    let failed = serde_json::json!({
                        "name": scenario.name,
                        "outcome": "failed",
                        "kind": e.as_str(),
                        "reason": e.to_string(),
                    });
                    println!("{failed}");
                } else {
                    println!("{:<42} {:<10}", scenario.name, "failed");
                    println!("    [{}] {e}", e.as_str());
                }
            }
        }
    }

    if !cluster.is_empty() {
        return Err(anyhow!(
            "{} Service(s) left behind in the simulated cluster",
            cluster.len()
        ));
    }
    if failures > 0 {
        return Err(anyhow!("{failures} of {} scenario(s) failed", scenarios.len()));
    }
    Ok(())
}
