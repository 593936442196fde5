use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};

use artifortress_auth::{Principal, resolve_principal};
use artifortress_metastore::InMemoryMetadataStore;
use artifortress_objectstore::InMemoryObjectStore;
use artifortress_types::{GcMode, RepoType};

mod progress;
mod scenario;

use progress::StepProgress;

#[derive(Parser, Debug)]
#[command(name = "artifortress-cli", version)]
#[command(about = "Operator CLI for an Artifortress control plane")]
struct Cli {
    /// Tenant the demo scenario runs under.
    #[arg(long, default_value = "demo-tenant", global = true)]
    tenant: String,

    /// Repo key the demo scenario creates.
    #[arg(long, default_value = "demo-lib", global = true)]
    repo_key: String,

    /// Bootstrap secret used to issue the scenario's first PAT.
    #[arg(long, env = "ARTIFORTRESS_BOOTSTRAP_SECRET", default_value = "demo-secret", global = true)]
    bootstrap_secret: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Walk a tenant through bootstrap, repo creation, an upload, a
    /// published version, and a garbage collection pass.
    Demo,
    /// Seed a published version and run garbage collection against it.
    Gc {
        /// Actually delete unreachable blobs instead of only counting them.
        #[arg(long)]
        execute: bool,
    },
    /// Print the operator dashboard counters.
    OpsSummary,
    /// Print the read-only blob/manifest consistency report.
    Reconcile,
    /// List or export the tenant's audit log.
    Audit {
        /// Emit newline-delimited JSON instead of a table.
        #[arg(long)]
        export: bool,
    },
    /// Print shell completions for this CLI to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.cmd {
        generate(*shell, &mut Cli::command(), "artifortress-cli", &mut std::io::stdout());
        return Ok(());
    }

    let metastore = Arc::new(InMemoryMetadataStore::new());
    let object_store = Arc::new(InMemoryObjectStore::new());
    let mut state = artifortress_core::AppState::new(metastore, object_store.clone());
    state.federation.bootstrap_secret = Some(cli.bootstrap_secret.clone());

    match cli.cmd {
        Commands::Completions { .. } => unreachable!("handled above"),
        Commands::Demo => run_demo(&state, &object_store, &cli.tenant, &cli.repo_key)?,
        Commands::Gc { execute } => run_gc(&state, &object_store, &cli.tenant, &cli.repo_key, execute)?,
        Commands::OpsSummary => run_ops_summary(&state, &object_store, &cli.tenant, &cli.repo_key)?,
        Commands::Reconcile => run_reconcile(&state, &object_store, &cli.tenant, &cli.repo_key)?,
        Commands::Audit { export } => run_audit(&state, &object_store, &cli.tenant, &cli.repo_key, export)?,
    }

    Ok(())
}

fn bootstrap_admin(state: &artifortress_core::AppState, tenant_id: &str) -> Result<Principal> {
    let issued = artifortress_core::issue_pat(
        state,
        tenant_id,
        None,
        state.federation.bootstrap_secret.as_deref(),
        "operator",
        vec!["*:admin".to_string()],
        60,
        Utc::now(),
    )
    .context("issuing bootstrap PAT")?;
    resolve_principal(&state.metastore, &state.federation, &issued.token).context("resolving bootstrap principal")
}

fn run_demo(state: &artifortress_core::AppState, object_store: &Arc<InMemoryObjectStore>, tenant_id: &str, repo_key: &str) -> Result<()> {
    let mut progress = StepProgress::new(8);

    progress.step("bootstrapping tenant");
    let admin = bootstrap_admin(state, tenant_id)?;
    println!("whoami: {:?}", artifortress_core::whoami(&admin).scopes);

    progress.step("creating repo");
    let repo = artifortress_core::create_repo(state, &admin, tenant_id, repo_key, RepoType::Local, None, vec![]).context("creating repo")?;
    println!("repo: {} ({:?})", repo.repo_id, repo.repo_type);

    progress.step("uploading and publishing a version");
    let version = scenario::upload_and_publish(state, object_store, &admin, tenant_id, &repo, "1.0.0")?;
    println!("published version: {} at {:?}", version.version_id, version.published_at);

    progress.step("reading the manifest back");
    let manifest = artifortress_core::get_manifest(state, &admin, repo_key, &version.version_id)?;
    println!("manifest: {}", manifest.document);

    progress.step("running garbage collection (dry run)");
    let gc_run = artifortress_core::run_gc(state, &admin, GcMode::DryRun, Utc::now())?;
    print_gc_run(&gc_run);

    progress.step("reading the ops summary");
    let summary = artifortress_core::ops_summary(state, &admin, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    progress.step("reconciling blob references");
    let report = artifortress_core::reconcile_blobs(state, &admin)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    progress.step("exporting the audit log");
    let bytes = artifortress_core::export_audit(state, &admin, tenant_id)?;
    print!("{}", String::from_utf8_lossy(&bytes));

    progress.finish();
    Ok(())
}

fn run_gc(state: &artifortress_core::AppState, object_store: &Arc<InMemoryObjectStore>, tenant_id: &str, repo_key: &str, execute: bool) -> Result<()> {
    let admin = bootstrap_admin(state, tenant_id)?;
    let repo = artifortress_core::create_repo(state, &admin, tenant_id, repo_key, RepoType::Local, None, vec![])?;
    scenario::upload_and_publish(state, object_store, &admin, tenant_id, &repo, "1.0.0")?;

    let mode = if execute { GcMode::Execute } else { GcMode::DryRun };
    let run = artifortress_core::run_gc(state, &admin, mode, Utc::now())?;
    print_gc_run(&run);
    Ok(())
}

fn print_gc_run(run: &artifortress_types::GcRun) {
    println!("gc run: {} ({:?})", run.run_id, run.mode);
    println!(
        "  marked={} candidates={} deleted_blobs={} deleted_versions={} errors={}",
        run.counters.marked, run.counters.candidate_blob_count, run.counters.deleted_blob_count, run.counters.deleted_version_count, run.counters.delete_error_count
    );
}

fn run_ops_summary(state: &artifortress_core::AppState, object_store: &Arc<InMemoryObjectStore>, tenant_id: &str, repo_key: &str) -> Result<()> {
    let admin = bootstrap_admin(state, tenant_id)?;
    let repo = artifortress_core::create_repo(state, &admin, tenant_id, repo_key, RepoType::Local, None, vec![])?;
    scenario::upload_and_publish(state, object_store, &admin, tenant_id, &repo, "1.0.0")?;

    let summary = artifortress_core::ops_summary(state, &admin, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_reconcile(state: &artifortress_core::AppState, object_store: &Arc<InMemoryObjectStore>, tenant_id: &str, repo_key: &str) -> Result<()> {
    let admin = bootstrap_admin(state, tenant_id)?;
    let repo = artifortress_core::create_repo(state, &admin, tenant_id, repo_key, RepoType::Local, None, vec![])?;
    scenario::upload_and_publish(state, object_store, &admin, tenant_id, &repo, "1.0.0")?;

    let report = artifortress_core::reconcile_blobs(state, &admin)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_audit(state: &artifortress_core::AppState, object_store: &Arc<InMemoryObjectStore>, tenant_id: &str, repo_key: &str, export: bool) -> Result<()> {
    let admin = bootstrap_admin(state, tenant_id)?;
    let repo = artifortress_core::create_repo(state, &admin, tenant_id, repo_key, RepoType::Local, None, vec![])?;
    scenario::upload_and_publish(state, object_store, &admin, tenant_id, &repo, "1.0.0")?;

    if export {
        let bytes = artifortress_core::export_audit(state, &admin, tenant_id)?;
        print!("{}", String::from_utf8_lossy(&bytes));
    } else {
        let entries = artifortress_core::list_audit(state, &admin, tenant_id)?;
        if entries.is_empty() {
            bail!("no audit entries recorded for tenant {tenant_id}");
        }
        for entry in entries {
            println!("{} {} {} {}/{}", entry.occurred_at, entry.actor, entry.action, entry.resource_type, entry.resource_id);
        }
    }
    Ok(())
}
