//! DynamoDB infrastructure management commands.

mod client;
mod config;
mod deploy;
mod error;
mod planning;

pub use error::{DynamodbError, Result};

use crate::prelude::*;
use dialoguer::Confirm;
use dynastore_core::config::StoreConfig;

/// DynamoDB infrastructure management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy DynamoDB table infrastructure.
    Deploy(DeployCommand),
}

/// Deploy or update DynamoDB infrastructure.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy DynamoDB table infrastructure.

By default, this command creates the fixed tables used by the integration
suite. With --config it derives one table per configured entity from a
store configuration file, including Global Secondary Indexes (GSIs).

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  AWS_ENDPOINT_URL    - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION          - AWS region (defaults to us-east-1)
  AWS_PROFILE         - AWS profile to use for credentials")]
pub struct DeployCommand {
    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the tables instead of creating/updating.
    #[arg(long)]
    pub destroy: bool,

    /// Path to a store configuration JSON file to derive tables from.
    #[arg(long, value_name = "PATH")]
    pub config: Option<std::path::PathBuf>,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
    }
}

fn load_schemas(cmd: &DeployCommand) -> Result<Vec<config::TableSchema>> {
    match &cmd.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let store: StoreConfig = serde_json::from_str(&text)?;
            Ok(config::from_store_config(&store))
        }
        None => Ok(config::test_schemas()),
    }
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let aws_config = client::AwsConfig::default();
    let schemas = load_schemas(&cmd)?;

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await?;

    if cmd.destroy {
        // Destroy flow
        let mut plans = Vec::with_capacity(schemas.len());
        for schema in &schemas {
            let current_state = client::get_table_state(&dynamo_client, &schema.name).await?;
            plans.push(planning::calculate_destroy_plan(
                current_state.as_ref(),
                &schema.name,
            ));
        }

        if !global.is_silent() {
            aprintln!("{}", p_y("Destroy Plan:"));
            for plan in &plans {
                for line in planning::format_destroy_plan(plan) {
                    aprintln!("  {}", p_r(&line));
                }
            }
            aprintln!();
        }

        if plans
            .iter()
            .all(|plan| matches!(plan, planning::DestroyPlan::AlreadyGone { .. }))
        {
            if !global.is_silent() {
                aprintln!("{}", p_g("Nothing to destroy."));
            }
            return Ok(());
        }

        if !cmd.force {
            let confirmed = Confirm::new()
                .with_prompt("Are you sure you want to delete these tables? ALL DATA WILL BE LOST")
                .default(false)
                .interact()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

            if !confirmed {
                return Err(DynamodbError::UserCancelled);
            }
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Deleting tables..."));
        }

        for plan in &plans {
            deploy::execute_destroy_plan(&dynamo_client, plan).await?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_g("Tables destroyed successfully."));
        }
    } else {
        // Deploy flow
        let mut plans = Vec::with_capacity(schemas.len());
        for schema in &schemas {
            let current_state = client::get_table_state(&dynamo_client, &schema.name).await?;
            plans.push(planning::calculate_deploy_plan(
                current_state.as_ref(),
                schema,
            ));
        }

        if !global.is_silent() {
            aprintln!("{}", p_c("Deploy Plan:"));
            for plan in &plans {
                for line in planning::format_deploy_plan(plan) {
                    if line.starts_with('+') {
                        aprintln!("  {}", p_g(&line));
                    } else if line.starts_with('-') {
                        aprintln!("  {}", p_r(&line));
                    } else if line.starts_with('~') {
                        aprintln!("  {}", p_y(&line));
                    } else {
                        aprintln!("  {}", line);
                    }
                }
            }
            aprintln!();
        }

        if plans
            .iter()
            .all(|plan| matches!(plan, planning::DeployPlan::NoChanges { .. }))
        {
            if !global.is_silent() {
                aprintln!("{}", p_g("Infrastructure is up to date."));
            }
            return Ok(());
        }

        if !cmd.force {
            let confirmed = Confirm::new()
                .with_prompt("Apply these changes?")
                .default(true)
                .interact()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

            if !confirmed {
                return Err(DynamodbError::UserCancelled);
            }
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Applying changes..."));
        }

        for plan in &plans {
            deploy::execute_deploy_plan(&dynamo_client, plan).await?;
        }

        if !global.is_silent() {
            aprintln!("{}", p_g("Infrastructure deployed successfully."));
        }
    }

    Ok(())
}
