//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use dealdesk_core::import::{ImportOptions, import_contacts, parse_csv_file};
use dealdesk_core::integration::{SyncOperation, UnavailableIntegration, run_sync};
use dealdesk_core::pipeline::{
    AdvanceOutcome, PipelineBoard, PipelineItem, contact_board, opportunity_board, persona_contacts,
};
use dealdesk_core::references::{company_for_contact, lists_containing, resolve_list_members};
use dealdesk_core::{Persona, PipelineStage, Session, classify_persona, normalize_stage};
use dealdesk_shared::{
    AppConfig, CampaignDraft, CampaignId, CampaignStatus, CompanyDraft, CompanyId, ContactDraft,
    ContactId, ContactListDraft, ContactListId, ContactPatch, ContactStatus, OpportunityDraft,
    StoreBackendKind, init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// DealDesk: a local console for contacts, lists, campaigns, and deals.
#[derive(Parser)]
#[command(
    name = "dealdesk",
    version,
    about = "Manage contacts, contact lists, campaigns, and the deal pipeline.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Store directory, overriding `[store] data_dir`.
    #[arg(long, env = "DEALDESK_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Use a throwaway in-memory store.
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Manage contacts.
    Contact {
        #[command(subcommand)]
        action: ContactAction,
    },

    /// Manage companies and their opportunities.
    Company {
        #[command(subcommand)]
        action: CompanyAction,
    },

    /// Manage contact lists.
    List {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Manage campaigns and their list bindings.
    Campaign {
        #[command(subcommand)]
        action: CampaignAction,
    },

    /// Pipeline boards and stage transitions.
    Pipeline {
        #[command(subcommand)]
        action: PipelineAction,
    },

    /// Import contacts from a CSV file.
    Import {
        /// CSV file with a header row.
        csv: PathBuf,

        /// Also create a contact list of the imported contacts.
        #[arg(long)]
        list: Option<String>,

        /// `source` recorded on rows without one.
        #[arg(long)]
        source: Option<String>,
    },

    /// Sync with the configured CRM.
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Contact fields shared by `add` and `update`.
#[derive(Args, Default)]
pub(crate) struct ContactFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    /// cold, warm, active, or signed.
    #[arg(long)]
    pub status: Option<ContactStatus>,
    /// Free-text stage label.
    #[arg(long)]
    pub stage: Option<String>,
    #[arg(long)]
    pub value: Option<f64>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum ContactAction {
    /// Create a contact.
    Add {
        #[command(flatten)]
        fields: ContactFields,
    },
    /// List contacts.
    List {
        /// Only contacts of this persona.
        #[arg(long)]
        persona: Option<Persona>,
    },
    /// Show one contact with its resolved references.
    Show { id: ContactId },
    /// Change fields on a contact.
    Update {
        id: ContactId,
        #[command(flatten)]
        fields: ContactFields,
    },
    /// Delete a contact. Lists keep the id.
    Delete { id: ContactId },
}

#[derive(Subcommand)]
pub(crate) enum CompanyAction {
    /// Create a company.
    Add {
        name: String,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        employees: Option<String>,
    },
    /// List companies.
    List,
    /// Delete a company.
    Delete { id: CompanyId },
    /// Add an opportunity to a company.
    AddOpportunity {
        company: CompanyId,
        name: String,
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        value: Option<f64>,
    },
}

#[derive(Subcommand)]
pub(crate) enum ListAction {
    /// Create a contact list.
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "type")]
        list_type: Option<String>,
        /// Initial members.
        #[arg(long = "contact")]
        contacts: Vec<ContactId>,
    },
    /// Show a list and its live members.
    Show { id: ContactListId },
    /// List all contact lists.
    List,
    /// Add contacts to a list.
    Add {
        id: ContactListId,
        #[arg(required = true)]
        contacts: Vec<ContactId>,
    },
    /// Remove contacts from a list.
    Remove {
        id: ContactListId,
        #[arg(required = true)]
        contacts: Vec<ContactId>,
    },
    /// Delete a list. Campaigns referencing it are left dangling.
    Delete { id: ContactListId },
}

#[derive(Subcommand)]
pub(crate) enum CampaignAction {
    /// Create a campaign.
    Create {
        name: String,
        /// Contact list to bind.
        #[arg(long)]
        list: Option<ContactListId>,
        #[arg(long)]
        status: Option<CampaignStatus>,
    },
    /// List campaigns.
    List,
    /// Bind a list to a campaign.
    Assign {
        campaign: CampaignId,
        list: ContactListId,
    },
    /// Clear a campaign's list.
    Unassign { campaign: CampaignId },
    /// Delete a campaign, releasing its list.
    Delete { id: CampaignId },
}

#[derive(Subcommand)]
pub(crate) enum PipelineAction {
    /// Print the stage board.
    Show {
        /// Restrict the contact board to one persona.
        #[arg(long, conflicts_with = "opportunities")]
        persona: Option<Persona>,
        /// Board company opportunities instead of contacts.
        #[arg(long)]
        opportunities: bool,
    },
    /// Move a contact to its next stage.
    Advance { id: ContactId },
    /// Move a contact to a specific stage.
    Move { id: ContactId, stage: PipelineStage },
}

#[derive(Subcommand)]
pub(crate) enum SyncAction {
    /// Pull accounts from the CRM.
    Accounts,
    /// Hydrate contact details from the CRM.
    Contacts,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "dealdesk=info",
        1 => "dealdesk=debug",
        _ => "dealdesk=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let Cli {
        data_dir,
        memory,
        command,
        ..
    } = cli;

    if let Command::Config { action } = command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(data_dir, memory),
        };
    }

    let config = resolve_config(data_dir, memory)?;
    let mut session = Session::open(&config)?;

    let outcome = match command {
        Command::Contact { action } => cmd_contact(&mut session, action),
        Command::Company { action } => cmd_company(&mut session, action),
        Command::List { action } => cmd_list(&mut session, action),
        Command::Campaign { action } => cmd_campaign(&mut session, action),
        Command::Pipeline { action } => cmd_pipeline(&mut session, action),
        Command::Import { csv, list, source } => cmd_import(&mut session, csv, list, source),
        Command::Sync { action } => cmd_sync(action).await,
        Command::Config { .. } => Ok(()),
    };

    session.close();
    outcome
}

/// Config file plus command-line overrides.
fn resolve_config(data_dir: Option<PathBuf>, memory: bool) -> Result<AppConfig> {
    Ok(apply_overrides(load_config()?, data_dir, memory))
}

fn apply_overrides(mut config: AppConfig, data_dir: Option<PathBuf>, memory: bool) -> AppConfig {
    if memory {
        config.store.backend = StoreBackendKind::Memory;
    } else if let Some(dir) = data_dir {
        config.store.backend = StoreBackendKind::File;
        config.store.data_dir = dir.to_string_lossy().into_owned();
    }
    config
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

fn cmd_contact(session: &mut Session, action: ContactAction) -> Result<()> {
    match action {
        ContactAction::Add { fields } => {
            let contact = session.contacts().create(ContactDraft {
                name: fields.name,
                first_name: fields.first_name,
                last_name: fields.last_name,
                email: fields.email,
                phone: fields.phone,
                company: fields.company,
                title: fields.title,
                status: fields.status,
                stage: fields.stage,
                value: fields.value,
                notes: fields.notes,
                source: Some("cli".into()),
                ..ContactDraft::default()
            })?;
            info!(id = %contact.id, "contact created");
            println!("{}", contact.id);
        }
        ContactAction::List { persona } => {
            for item in persona_contacts(session.contacts().list(), persona) {
                let contact = &item.contact;
                println!(
                    "{}  {:<28} {:<32} {:<22} {}",
                    contact.id,
                    contact.display_name(),
                    contact.email,
                    normalize_stage(contact.stage.as_deref()),
                    item.persona,
                );
            }
        }
        ContactAction::Show { id } => {
            let contact = session
                .contacts()
                .get(id)
                .ok_or_else(|| eyre!("contact not found: {id}"))?;
            let stage = normalize_stage(contact.stage.as_deref());

            println!();
            println!("  {}", contact.display_name());
            println!("  ID:       {}", contact.id);
            println!("  Email:    {}", contact.email);
            if let Some(title) = &contact.title {
                println!("  Title:    {title}");
            }
            println!("  Persona:  {}", classify_persona(contact.title.as_deref()));
            println!("  Status:   {}", contact.status);
            println!(
                "  Stage:    {stage} ({})",
                contact.stage.as_deref().unwrap_or("unset")
            );
            println!("  Value:    {:.2}", contact.pipeline_value());
            match (&contact.company, company_for_contact(session.store(), &contact)) {
                (Some(_), Some(company)) => println!("  Company:  {} ({})", company.name, company.id),
                (Some(name), None) => println!("  Company:  {name} (not on file)"),
                (None, _) => {}
            }
            for list in lists_containing(session.store(), contact.id) {
                println!("  List:     {} ({})", list.name, list.id);
            }
            println!();
        }
        ContactAction::Update { id, fields } => {
            let contact = session.contacts().update(
                id,
                ContactPatch {
                    name: fields.name,
                    first_name: fields.first_name,
                    last_name: fields.last_name,
                    email: fields.email,
                    phone: fields.phone,
                    company: fields.company,
                    title: fields.title,
                    status: fields.status,
                    stage: fields.stage,
                    value: fields.value,
                    notes: fields.notes,
                    ..ContactPatch::default()
                },
            )?;
            println!("Updated {}", contact.display_name());
        }
        ContactAction::Delete { id } => {
            session.contacts().delete(id)?;
            println!("Deleted contact {id}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Companies
// ---------------------------------------------------------------------------

fn cmd_company(session: &mut Session, action: CompanyAction) -> Result<()> {
    match action {
        CompanyAction::Add {
            name,
            industry,
            location,
            employees,
        } => {
            let company = session.companies().create(CompanyDraft {
                name: Some(name),
                industry,
                location,
                employees,
            })?;
            println!("{}", company.id);
        }
        CompanyAction::List => {
            for company in session.companies().list() {
                println!(
                    "{}  {:<32} {:<20} {} opportunities",
                    company.id,
                    company.name,
                    company.industry.as_deref().unwrap_or("-"),
                    company.opportunities.len(),
                );
            }
        }
        CompanyAction::Delete { id } => {
            session.companies().delete(id)?;
            println!("Deleted company {id}");
        }
        CompanyAction::AddOpportunity {
            company,
            name,
            stage,
            value,
        } => {
            let opportunity = session.companies().add_opportunity(
                company,
                OpportunityDraft {
                    name: Some(name),
                    stage,
                    value,
                },
            )?;
            println!("{}", opportunity.id);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

fn cmd_list(session: &mut Session, action: ListAction) -> Result<()> {
    match action {
        ListAction::Create {
            name,
            description,
            list_type,
            contacts,
        } => {
            let list = session.lists().create(ContactListDraft {
                name: Some(name),
                description,
                list_type,
                contact_ids: contacts,
            })?;
            println!("{}", list.id);
        }
        ListAction::Show { id } => {
            let resolved = resolve_list_members(session.store(), id)?;
            let assignment = session.is_list_assigned(id);

            println!();
            println!("  {}", resolved.list.name);
            println!("  ID:       {}", resolved.list.id);
            if let Some(kind) = &resolved.list.list_type {
                println!("  Type:     {kind}");
            }
            match &assignment.campaign {
                Some(campaign) => println!("  Campaign: {} ({})", campaign.name, campaign.id),
                None => println!("  Campaign: unassigned"),
            }
            println!(
                "  Members:  {} live / {} recorded",
                resolved.live_total(),
                resolved.list.total_contacts
            );
            for contact in &resolved.members {
                println!("    {}  {} <{}>", contact.id, contact.display_name(), contact.email);
            }
            for missing in &resolved.missing {
                println!("    {missing}  (deleted)");
            }
            println!();
        }
        ListAction::List => {
            let lists = session.lists().list();
            for list in lists {
                let assigned = session.is_list_assigned(list.id).assigned;
                println!(
                    "{}  {:<32} {:>5} contacts  {}",
                    list.id,
                    list.name,
                    list.total_contacts,
                    if assigned { "assigned" } else { "free" },
                );
            }
        }
        ListAction::Add { id, contacts } => {
            let list = session.lists().add_list_members(id, &contacts)?;
            println!("{} now has {} contacts", list.name, list.total_contacts);
        }
        ListAction::Remove { id, contacts } => {
            let list = session.lists().remove_list_members(id, &contacts)?;
            println!("{} now has {} contacts", list.name, list.total_contacts);
        }
        ListAction::Delete { id } => {
            session.delete_list(id)?;
            println!("Deleted list {id}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

fn cmd_campaign(session: &mut Session, action: CampaignAction) -> Result<()> {
    match action {
        CampaignAction::Create { name, list, status } => {
            let campaign = session.create_campaign(CampaignDraft {
                name: Some(name),
                contact_list_id: list,
                status,
            })?;
            println!("{}", campaign.id);
        }
        CampaignAction::List => {
            for campaign in session.campaigns().list() {
                let list = campaign
                    .contact_list_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{}  {:<32} {:<10} {list}",
                    campaign.id, campaign.name, campaign.status
                );
            }
        }
        CampaignAction::Assign { campaign, list } => {
            let campaign = session.assign_list(campaign, list)?;
            println!("{} now targets list {list}", campaign.name);
        }
        CampaignAction::Unassign { campaign } => {
            let campaign = session.unassign_list(campaign)?;
            println!("{} has no list", campaign.name);
        }
        CampaignAction::Delete { id } => {
            session.delete_campaign(id)?;
            println!("Deleted campaign {id}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn cmd_pipeline(session: &mut Session, action: PipelineAction) -> Result<()> {
    match action {
        PipelineAction::Show {
            persona,
            opportunities,
        } => {
            if opportunities {
                let board = opportunity_board(session.companies().list());
                print_board(&board, |item| {
                    format!("{} / {}", item.company_name, item.opportunity.name)
                });
            } else {
                let board = contact_board(session.contacts().list(), persona);
                print_board(&board, |item| {
                    format!("{} ({})", item.contact.display_name(), item.persona)
                });
            }
        }
        PipelineAction::Advance { id } => match session.advance(id)? {
            AdvanceOutcome::Advanced { from, to, contact } => {
                println!("{}: {from} -> {to}", contact.display_name());
            }
            AdvanceOutcome::AlreadyTerminal { stage } => {
                println!("Already at {stage}; nothing to do");
            }
        },
        PipelineAction::Move { id, stage } => {
            let contact = session.move_contact(id, stage)?;
            println!("{} is now at {stage}", contact.display_name());
        }
    }
    Ok(())
}

fn print_board<T: PipelineItem>(board: &PipelineBoard<T>, describe: impl Fn(&T) -> String) {
    println!();
    for bucket in &board.buckets {
        println!(
            "  {:<24} {:>4}  {:>14.2}",
            bucket.stage.label(),
            bucket.count,
            bucket.total_value
        );
        for member in &bucket.members {
            println!("      {}", describe(member));
        }
    }
    println!(
        "  {:<24} {:>4}  {:>14.2}",
        "Total",
        board.total_count(),
        board.total_value()
    );
    println!();
}

// ---------------------------------------------------------------------------
// Import and sync
// ---------------------------------------------------------------------------

fn cmd_import(
    session: &mut Session,
    csv: PathBuf,
    list: Option<String>,
    source: Option<String>,
) -> Result<()> {
    info!(path = %csv.display(), "importing contacts");
    let rows = parse_csv_file(&csv)?;
    let options = ImportOptions {
        list_name: list,
        source: source.or_else(|| Some("csv".into())),
    };
    let report = import_contacts(session.store_mut(), &rows, &options)?;

    println!();
    println!("  Imported: {}", report.imported.len());
    println!("  Dropped:  {} (no email)", report.dropped);
    if let Some(list_id) = report.list_id {
        println!("  List:     {list_id}");
    }
    println!();
    Ok(())
}

async fn cmd_sync(action: SyncAction) -> Result<()> {
    let operation = match action {
        SyncAction::Accounts => SyncOperation::Accounts,
        SyncAction::Contacts => SyncOperation::Contacts,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(format!("Syncing {operation}"));

    let crm = UnavailableIntegration::new("crm");
    let result = run_sync(&crm, operation).await;
    spinner.finish_and_clear();

    let count = result?;
    println!("Synced {count} {operation}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(data_dir: Option<PathBuf>, memory: bool) -> Result<()> {
    let config = resolve_config(data_dir, memory)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_pipeline_move() {
        let id = ContactId::new();
        let raw = id.to_string();
        let cli = Cli::try_parse_from([
            "dealdesk",
            "--memory",
            "pipeline",
            "move",
            raw.as_str(),
            "had-meeting",
        ])
        .expect("parse");
        assert!(cli.memory);
        match cli.command {
            Command::Pipeline {
                action: PipelineAction::Move { id: parsed, stage },
            } => {
                assert_eq!(parsed, id);
                assert_eq!(stage, PipelineStage::HadMeeting);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn rejects_fuzzy_stage_on_move() {
        let id = ContactId::new().to_string();
        assert!(
            Cli::try_parse_from(["dealdesk", "pipeline", "move", id.as_str(), "proposal"]).is_err()
        );
    }

    #[test]
    fn memory_flag_overrides_backend() {
        let mut file_config = AppConfig::default();
        file_config.store.backend = StoreBackendKind::File;
        let config = apply_overrides(file_config, Some(PathBuf::from("/tmp/ignored")), true);
        assert_eq!(config.store.backend, StoreBackendKind::Memory);
    }

    #[test]
    fn data_dir_flag_selects_database_backend() {
        let mut memory_config = AppConfig::default();
        memory_config.store.backend = StoreBackendKind::Memory;
        let config = apply_overrides(memory_config, Some(PathBuf::from("/srv/dealdesk")), false);
        assert_eq!(config.store.backend, StoreBackendKind::File);
        assert_eq!(config.store.data_dir, "/srv/dealdesk");
    }
}
