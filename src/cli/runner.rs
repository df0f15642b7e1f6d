//! CLI runner - executes commands

use crate::agencyzoom::AgencyZoomClient;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{Config, Needs};
use crate::engine::{Pipeline, RunStats};
use crate::error::Result;
use crate::state::SeenCache;
use crate::todoist::{Section, TodoistClient};
use serde_json::json;
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
    config: Option<Config>,
}

impl Runner {
    /// Create a runner that reads its configuration from the environment
    pub fn new(cli: Cli) -> Self {
        Self { cli, config: None }
    }

    /// Create a runner with an already loaded configuration
    pub fn with_config(cli: Cli, config: Config) -> Self {
        Self {
            cli,
            config: Some(config),
        }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let mut config = match &self.config {
            Some(config) => config.clone(),
            None => Config::from_env()?,
        };
        apply_overrides(&mut config, &self.cli.command);

        match &self.cli.command {
            Commands::Relay { .. } => self.relay(config).await,
            Commands::Export { .. } => self.export(config).await,
            Commands::Dump { .. } => self.dump(config).await,
            Commands::Probe { sample_threads, .. } => self.probe(config, *sample_threads).await,
            Commands::Sections { project_id } => self.sections(&config, project_id).await,
        }
    }

    async fn relay(&self, config: Config) -> Result<()> {
        config.validate(Needs {
            agencyzoom: true,
            todoist: !config.dry_run,
        })?;
        if config.dry_run {
            info!("Dry run: no Todoist tasks will be created");
        }

        let todoist = if config.dry_run {
            None
        } else {
            Some(TodoistClient::from_config(
                &config.todoist,
                config.agencyzoom.request_timeout,
            )?)
        };
        let mut cache = SeenCache::load(&config.outputs.cache_file);
        let pipeline = build_pipeline(config)?;
        let mut session = pipeline.session()?;

        let stats = pipeline
            .relay(&mut session, &mut cache, todoist.as_ref())
            .await?;
        self.output_stats(&stats);
        Ok(())
    }

    async fn export(&self, config: Config) -> Result<()> {
        config.validate(Needs {
            agencyzoom: true,
            todoist: false,
        })?;
        let pipeline = build_pipeline(config)?;
        let mut session = pipeline.session()?;

        let stats = pipeline.export(&mut session).await?;
        self.output_stats(&stats);
        Ok(())
    }

    async fn dump(&self, config: Config) -> Result<()> {
        config.validate(Needs {
            agencyzoom: true,
            todoist: false,
        })?;
        let dir = config.outputs.dump_dir.clone();
        let pipeline = build_pipeline(config)?;
        let mut session = pipeline.session()?;

        let written = pipeline.dump(&mut session, &dir).await?;
        match self.cli.format {
            OutputFormat::Json => {
                let files: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
                self.output_message(&json!({ "files": files }));
            }
            OutputFormat::Pretty => {
                for path in &written {
                    println!("{}", path.display());
                }
            }
        }
        Ok(())
    }

    async fn probe(&self, config: Config, sample_threads: usize) -> Result<()> {
        config.validate(Needs {
            agencyzoom: true,
            todoist: false,
        })?;
        let dir = config.outputs.dump_dir.clone();
        let pipeline = build_pipeline(config)?;
        let mut session = pipeline.session()?;

        let summary = pipeline.probe(&mut session, &dir, sample_threads).await?;
        match self.cli.format {
            OutputFormat::Json => self.output_message(&json!(summary)),
            OutputFormat::Pretty => {
                println!("Base:              {}", summary.base);
                println!("Threads found:     {}", summary.threads_found);
                println!("Details sampled:   {}", summary.details_sampled);
                println!("Producer data:     {}", summary.has_producer_data);
                println!("Unread data:       {}", summary.has_unread_data);
                println!("Written to:        {}", dir.display());
            }
        }
        Ok(())
    }

    async fn sections(&self, config: &Config, project_id: &str) -> Result<()> {
        config.validate(Needs {
            agencyzoom: false,
            todoist: true,
        })?;
        let client = TodoistClient::from_config(&config.todoist, config.agencyzoom.request_timeout)?;

        let sections = client.list_sections(project_id).await?;
        self.output_sections(project_id, &sections);
        Ok(())
    }

    fn output_stats(&self, stats: &RunStats) {
        match self.cli.format {
            OutputFormat::Json => self.output_message(&json!(stats)),
            OutputFormat::Pretty => println!("Done: {stats}"),
        }
    }

    fn output_sections(&self, project_id: &str, sections: &[Section]) {
        match self.cli.format {
            OutputFormat::Json => self.output_message(&json!(sections)),
            OutputFormat::Pretty => {
                if sections.is_empty() {
                    println!("No sections found in project {project_id}.");
                    return;
                }
                println!("Sections of project {project_id}:");
                for section in sections {
                    println!("{:<24} {}", section.id, section.name);
                }
                println!("\nSet TODOIST_SECTION_ID to one of the ids above.");
            }
        }
    }

    fn output_message(&self, msg: &serde_json::Value) {
        println!("{}", serde_json::to_string(msg).unwrap_or_default());
    }
}

/// Fold command-line flags into the configuration
pub(crate) fn apply_overrides(config: &mut Config, command: &Commands) {
    match command {
        Commands::Relay {
            dry_run,
            inbound_only,
            batch,
        } => {
            config.dry_run |= *dry_run;
            config.filters.inbound_only |= *inbound_only;
            config.todoist.batch |= *batch;
        }
        Commands::Export {
            inbound_only,
            output_dir,
        } => {
            config.filters.inbound_only |= *inbound_only;
            if let Some(dir) = output_dir {
                let outputs = &mut config.outputs;
                outputs.text_file = relocate(dir, &outputs.text_file);
                outputs.json_file = relocate(dir, &outputs.json_file);
            }
        }
        Commands::Dump {
            output_dir,
            save_raw,
        } => {
            if let Some(dir) = output_dir {
                config.outputs.dump_dir = dir.clone();
            }
            config.outputs.save_raw_pages |= *save_raw;
        }
        Commands::Probe {
            output_dir,
            save_raw,
            ..
        } => {
            // Probe files and their raw pages share one directory
            config.outputs.dump_dir = output_dir.clone();
            config.outputs.save_raw_pages |= *save_raw;
        }
        Commands::Sections { .. } => {}
    }
}

fn relocate(dir: &Path, file: &Path) -> std::path::PathBuf {
    match file.file_name() {
        Some(name) => dir.join(name),
        None => dir.to_path_buf(),
    }
}

fn build_pipeline(config: Config) -> Result<Pipeline> {
    let agencyzoom = AgencyZoomClient::from_config(&config.agencyzoom, config.outputs.raw_dir())?;
    Ok(Pipeline::new(config, agencyzoom))
}
