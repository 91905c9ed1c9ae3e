//! Subcommand execution against the core services.

use crate::error::CliError;
use crate::{CatCommand, Cli, Command, CreateCatArgs, MissionCommand};
use log::info;
use sca_core::breeds::BreedSource;
use sca_core::db::migrations::latest_version;
use sca_core::{
    init_logging, open_db, AssignmentCoordinator, CachedBreedCatalog, CatService,
    DispatchConfig, HttpBreedSource, MissionService, NewCat, SqliteCatRepository,
    SqliteMissionRepository, StaticBreedSource, TargetDraft, TargetUpdate,
};
use serde::Serialize;
use serde_json::{json, Value};

type Catalog = CachedBreedCatalog<Box<dyn BreedSource>>;

/// Runs one parsed command and returns its JSON result.
pub fn run(cli: Cli) -> Result<Value, CliError> {
    let mut config = DispatchConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(settings) = config.log_settings(true) {
        init_logging(&settings).map_err(CliError::Logging)?;
    }

    let conn = open_db(&config.db_path)?;
    match cli.command {
        Command::Migrate => {
            info!(
                "event=cli_migrate module=cli status=ok db_path={}",
                config.db_path.display()
            );
            Ok(json!({
                "db_path": config.db_path.display().to_string(),
                "schema_version": latest_version(),
            }))
        }
        Command::Breeds => {
            let cats = CatService::new(
                SqliteCatRepository::try_new(&conn)?,
                catalog(&config, cli.offline)?,
            );
            render(&cats.list_breeds()?)
        }
        Command::Cat(command) => {
            let cats = CatService::new(
                SqliteCatRepository::try_new(&conn)?,
                catalog(&config, cli.offline)?,
            );
            run_cat(&cats, command)
        }
        Command::Mission(command) => {
            let repo = SqliteMissionRepository::try_new(&conn)?;
            run_mission(repo, command)
        }
    }
}

fn run_cat(
    cats: &CatService<SqliteCatRepository<'_>, Catalog>,
    command: CatCommand,
) -> Result<Value, CliError> {
    match command {
        CatCommand::Create(CreateCatArgs {
            name,
            years,
            breed,
            salary_cents,
        }) => render(&cats.create_cat(&NewCat {
            name,
            years_of_experience: years,
            breed,
            salary_cents,
        })?),
        CatCommand::List => render(&cats.list_cats()?),
        CatCommand::Get { id } => render(&cats.get_cat(id)?),
        CatCommand::SetSalary { id, salary_cents } => {
            render(&cats.update_salary(id, salary_cents)?)
        }
        CatCommand::Delete { id } => {
            cats.delete_cat(id)?;
            Ok(json!({ "deleted": id }))
        }
    }
}

fn run_mission(
    repo: SqliteMissionRepository<'_>,
    command: MissionCommand,
) -> Result<Value, CliError> {
    let missions = MissionService::new(repo);
    match command {
        MissionCommand::Create { targets, cat } => {
            render(&missions.create_mission(&parse_targets(&targets)?, cat)?)
        }
        MissionCommand::List => render(&missions.list_missions()?),
        MissionCommand::Get { id } => render(&missions.get_mission(id)?),
        MissionCommand::Assign { mission, cat } => {
            render(&AssignmentCoordinator::new(repo).assign_cat(mission, cat)?)
        }
        MissionCommand::AddTargets { mission, targets } => {
            render(&missions.add_targets(mission, &parse_targets(&targets)?)?)
        }
        MissionCommand::UpdateTarget {
            mission,
            target,
            notes,
            complete,
        } => {
            let request = TargetUpdate { notes, complete };
            render(&missions.update_target(mission, target, &request)?)
        }
        MissionCommand::DeleteTarget { mission, target } => {
            missions.delete_target(mission, target)?;
            Ok(json!({ "deleted": target }))
        }
        MissionCommand::Complete { id } => render(&missions.complete_mission(id)?),
        MissionCommand::Delete { id } => {
            missions.delete_mission(id)?;
            Ok(json!({ "deleted": id }))
        }
    }
}

fn catalog(config: &DispatchConfig, offline: bool) -> Result<Catalog, CliError> {
    let source: Box<dyn BreedSource> = if offline {
        Box::new(StaticBreedSource::builtin())
    } else {
        Box::new(HttpBreedSource::new(
            config.breed_api_base_url.clone(),
            config.breed_api_key.clone(),
        )?)
    };
    Ok(CachedBreedCatalog::new(source, config.breed_cache_ttl))
}

fn render<T: Serialize>(value: &T) -> Result<Value, CliError> {
    Ok(serde_json::to_value(value)?)
}

fn parse_targets(raw: &[String]) -> Result<Vec<TargetDraft>, CliError> {
    raw.iter().map(|value| parse_target(value)).collect()
}

/// Parses `name:country[:notes]`; notes may contain further colons.
fn parse_target(value: &str) -> Result<TargetDraft, CliError> {
    let mut parts = value.splitn(3, ':');
    let name = parts.next().unwrap_or_default();
    let Some(country) = parts.next() else {
        return Err(CliError::BadArgument {
            field: "target",
            reason: format!("expected `name:country[:notes]`, got `{value}`"),
        });
    };
    let draft = TargetDraft::new(name, country);
    Ok(match parts.next() {
        Some(notes) => draft.with_notes(notes),
        None => draft,
    })
}
