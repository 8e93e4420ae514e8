use clap::{Parser, Subcommand};

use crate::api::Resource;
use crate::auth::{Role, Route};
use crate::config::Config;
use crate::domain::{
    property, Agent, AgentUpdate, Lead, LeadFilter, LeadStatus, LeadStatusCounts, LeadUpdate,
    ListingStatus, NewAgent, NewLead, NewProperty, NewTransaction, Property, PropertyUpdate,
    StatusFilter, Transaction, TransactionStatus, TransactionUpdate,
};
use crate::error::AppError;
use crate::services::{DashboardService, RecordList};
use crate::utils::sanitize::mask_secret;
use crate::utils::Paginator;
use crate::validation::{self, RegistrationForm, ValidationError};
use crate::AppContext;

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const ALL_ROLES: &[Role] = &Role::ALL;

#[derive(Parser)]
#[command(name = "estate-desk")]
#[command(about = "Estate Desk - real-estate CRM client", long_about = None)]
pub struct Cli {
    /// Send notifications to the log instead of the terminal
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the credential
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// admin, agent or user
        #[arg(long, default_value = "user")]
        role: Role,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// admin, agent or user
        #[arg(long)]
        role: String,
    },

    /// Sign out and remove the stored credential
    Logout,

    /// Show the signed-in profile
    Whoami,

    /// Property management (admin)
    #[command(subcommand)]
    Properties(PropertyCommands),

    /// Browse property listings
    Listings {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Agent management (admin)
    #[command(subcommand)]
    Agents(AgentCommands),

    /// Lead management (admin)
    #[command(subcommand)]
    Leads(LeadCommands),

    /// Transactions (create: any role, everything else: admin)
    #[command(subcommand)]
    Transactions(TransactionCommands),

    /// Summary statistics (admin)
    Dashboard,

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum PropertyCommands {
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Only properties no agent holds yet
        #[arg(long)]
        unassigned: bool,
    },
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        city: String,
        #[arg(long, default_value = "")]
        desc: String,
        #[arg(long, default_value = "")]
        image_url: String,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        assigned_to: Option<String>,
        /// pending, approved or rejected
        #[arg(long)]
        status: Option<ListingStatus>,
    },
    Delete {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

#[derive(Subcommand)]
pub enum AgentCommands {
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Property id to assign; repeatable
        #[arg(long = "assign")]
        assigned_properties: Vec<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Replaces the assigned properties; repeatable
        #[arg(long = "assign")]
        assigned_properties: Vec<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

#[derive(Subcommand)]
pub enum LeadCommands {
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Matches name, email or property reference
        #[arg(long, default_value = "")]
        search: String,
        /// all, new, contacted, qualified or converted
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        property_ref: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        property_ref: Option<String>,
        #[arg(long)]
        status: Option<LeadStatus>,
    },
    Delete {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Count leads per status
    Stats,
}

#[derive(Subcommand)]
pub enum TransactionCommands {
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    Show {
        id: String,
    },
    Create {
        /// Defaults to the signed-in user
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        agent: String,
        #[arg(long)]
        property_ref: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "pending")]
        status: TransactionStatus,
    },
    Update {
        id: String,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        property_ref: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        status: Option<TransactionStatus>,
    },
    Delete {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

pub async fn run(ctx: &AppContext, command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Login {
            email,
            password,
            role,
        } => {
            let route = ctx.controller.login(&email, &password, role).await?;
            println!("→ {}", route);
            Ok(())
        }
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
            role,
        } => {
            let form = RegistrationForm {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
                role,
            };
            let route = ctx.controller.register(&form).await?;
            println!("→ {}", route);
            Ok(())
        }
        Commands::Logout => {
            ctx.controller.logout().await?;
            ctx.notifier.success("Logged out");
            Ok(())
        }
        Commands::Whoami => handle_whoami(ctx).await,
        Commands::Properties(command) => {
            ctx.require(ADMIN_ONLY).await?;
            handle_properties(ctx, command).await
        }
        Commands::Listings { page } => {
            ctx.require(ALL_ROLES).await?;
            let mut list = RecordList::<Property>::load(&ctx.client, ctx.config.page_size).await?;
            turn_to(ctx, list.pages_mut(), page);
            print_page(list.pages());
            Ok(())
        }
        Commands::Agents(command) => {
            ctx.require(ADMIN_ONLY).await?;
            handle_agents(ctx, command).await
        }
        Commands::Leads(command) => {
            ctx.require(ADMIN_ONLY).await?;
            handle_leads(ctx, command).await
        }
        Commands::Transactions(command) => handle_transactions(ctx, command).await,
        Commands::Dashboard => {
            ctx.require(ADMIN_ONLY).await?;
            handle_dashboard(ctx).await
        }
        Commands::Config => handle_config_validate(&ctx.config),
    }
}

async fn handle_whoami(ctx: &AppContext) -> Result<(), AppError> {
    let identity = ctx.require(ALL_ROLES).await?;

    println!("Profile:");
    println!("  Name:  {}", identity.full_name());
    println!("  Email: {}", identity.email);
    println!("  Id:    {}", identity.user_id);
    match identity.role {
        Some(role) => println!("  Role:  {}", role),
        None => println!("  Role:  -"),
    }
    if let Some(exp) = identity
        .exp
        .and_then(|exp| chrono::DateTime::from_timestamp(exp, 0))
    {
        println!("  Expires: {}", exp.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(token) = ctx.session().credential() {
        println!("  Token: {}", mask_secret(&token));
    }
    println!("← {}", Route::profile_back_link(identity.role));
    Ok(())
}

async fn handle_properties(ctx: &AppContext, command: PropertyCommands) -> Result<(), AppError> {
    let api = ctx.client.properties();
    match command {
        PropertyCommands::List { page, unassigned } => {
            let mut list = RecordList::<Property>::load(&ctx.client, ctx.config.page_size).await?;
            if unassigned {
                list.pages_mut().retain(Property::is_unassigned);
            }
            turn_to(ctx, list.pages_mut(), page);
            print_page(list.pages());
        }
        PropertyCommands::Show { id } => print_record(&api.get(&id).await?),
        PropertyCommands::Create {
            title,
            price,
            city,
            desc,
            image_url,
        } => {
            let identity = ctx.session().identity().ok_or(AppError::Unauthenticated)?;
            let new_property = NewProperty {
                title: validation::sanitize_string(&title),
                price,
                city: city.trim().to_string(),
                created_by: identity.user_id,
                desc,
                image_url,
            };
            validation::validate_new_property(&new_property)?;
            let created = api.create(&new_property).await?;
            ctx.notifier.success("Property created");
            print_record(&created);
        }
        PropertyCommands::Update {
            id,
            title,
            price,
            city,
            desc,
            image_url,
            assigned_to,
            status,
        } => {
            let changes = PropertyUpdate {
                title,
                price,
                city,
                desc,
                image_url,
                assigned_to,
                status,
            };
            if changes.is_empty() {
                return Err(nothing_to_update());
            }
            if let Some(price) = changes.price {
                validation::validate_positive_price("price", price)?;
            }
            let updated = api.update(&id, &changes).await?;
            ctx.notifier.success("Property updated");
            print_record(&updated);
        }
        PropertyCommands::Delete { id, page } => delete_record::<Property>(ctx, &id, page).await?,
    }
    Ok(())
}

async fn handle_agents(ctx: &AppContext, command: AgentCommands) -> Result<(), AppError> {
    let api = ctx.client.agents();
    match command {
        AgentCommands::List { page } => {
            let mut list = RecordList::<Agent>::load(&ctx.client, ctx.config.page_size).await?;
            turn_to(ctx, list.pages_mut(), page);
            print_page(list.pages());
        }
        AgentCommands::Show { id } => print_record(&api.get(&id).await?),
        AgentCommands::Create {
            name,
            email,
            assigned_properties,
        } => {
            if !assigned_properties.is_empty() {
                let properties = ctx.client.properties().list().await?;
                let available = property::unassigned(&properties);
                if let Some(taken) = assigned_properties
                    .iter()
                    .find(|id| !available.iter().any(|p| &p.id == *id))
                {
                    return Err(ValidationError::new(
                        "assignedProperties",
                        format!("property {} is not available for assignment", taken),
                    )
                    .into());
                }
            }
            let new_agent = NewAgent {
                name: validation::sanitize_string(&name),
                email: email.trim().to_string(),
                assigned_properties,
            };
            validation::validate_new_agent(&new_agent)?;
            let created = api.create(&new_agent).await?;
            ctx.notifier.success("Agent created");
            print_record(&created);
        }
        AgentCommands::Update {
            id,
            name,
            email,
            assigned_properties,
            active,
        } => {
            let changes = AgentUpdate {
                name,
                email,
                assigned_properties: (!assigned_properties.is_empty())
                    .then_some(assigned_properties),
                is_active: active,
            };
            if changes == AgentUpdate::default() {
                return Err(nothing_to_update());
            }
            if let Some(email) = &changes.email {
                validation::validate_email("email", email)?;
            }
            let updated = api.update(&id, &changes).await?;
            ctx.notifier.success("Agent updated");
            print_record(&updated);
        }
        AgentCommands::Delete { id, page } => delete_record::<Agent>(ctx, &id, page).await?,
    }
    Ok(())
}

async fn handle_leads(ctx: &AppContext, command: LeadCommands) -> Result<(), AppError> {
    let api = ctx.client.leads();
    match command {
        LeadCommands::List {
            page,
            search,
            status,
        } => {
            let leads = api.list().await?;
            let filter = LeadFilter { search, status };
            let matching: Vec<Lead> = filter.apply(&leads).into_iter().cloned().collect();
            let mut pages = Paginator::new(matching, ctx.config.page_size);
            turn_to(ctx, &mut pages, page);
            print_page(&pages);
        }
        LeadCommands::Show { id } => print_record(&api.get(&id).await?),
        LeadCommands::Create {
            name,
            email,
            message,
            property_ref,
        } => {
            let new_lead = NewLead {
                name: validation::sanitize_string(&name),
                email: email.trim().to_string(),
                message,
                property_ref: property_ref.trim().to_string(),
            };
            validation::validate_new_lead(&new_lead)?;
            let created = api.create(&new_lead).await?;
            ctx.notifier.success("Lead created");
            print_record(&created);
        }
        LeadCommands::Update {
            id,
            name,
            email,
            message,
            property_ref,
            status,
        } => {
            let changes = LeadUpdate {
                name,
                email,
                message,
                property_ref,
                status,
            };
            if changes == LeadUpdate::default() {
                return Err(nothing_to_update());
            }
            let updated = api.update(&id, &changes).await?;
            ctx.notifier.success("Lead updated");
            print_record(&updated);
        }
        LeadCommands::Delete { id, page } => delete_record::<Lead>(ctx, &id, page).await?,
        LeadCommands::Stats => {
            let counts = LeadStatusCounts::tally(&api.list().await?);
            for status in LeadStatus::ALL {
                println!("{:<12} {}", status.label(), counts.get(status));
            }
            if counts.unknown > 0 {
                println!("{:<12} {}", LeadStatus::Unknown.label(), counts.unknown);
            }
        }
    }
    Ok(())
}

async fn handle_transactions(
    ctx: &AppContext,
    command: TransactionCommands,
) -> Result<(), AppError> {
    let api = ctx.client.transactions();
    if !matches!(command, TransactionCommands::Create { .. }) {
        ctx.require(ADMIN_ONLY).await?;
    }

    match command {
        TransactionCommands::Create {
            client,
            agent,
            property_ref,
            price,
            status,
        } => {
            let identity = ctx.require(ALL_ROLES).await?;
            let mut new_transaction = NewTransaction::for_client(Some(&identity));
            if let Some(client) = client {
                new_transaction.client = client;
            }
            new_transaction.agent = agent.trim().to_string();
            new_transaction.property_ref = property_ref.trim().to_string();
            new_transaction.price = price;
            new_transaction.status = status;

            validation::validate_new_transaction(&new_transaction)?;
            let created = api.create(&new_transaction).await?;
            ctx.notifier.success("Transaction created");
            print_record(&created);
        }
        TransactionCommands::List { page } => {
            let mut list =
                RecordList::<Transaction>::load(&ctx.client, ctx.config.page_size).await?;
            turn_to(ctx, list.pages_mut(), page);
            print_page(list.pages());
        }
        TransactionCommands::Show { id } => print_record(&api.get(&id).await?),
        TransactionCommands::Update {
            id,
            agent,
            property_ref,
            price,
            status,
        } => {
            let changes = TransactionUpdate {
                agent,
                property_ref,
                price,
                status,
            };
            if changes == TransactionUpdate::default() {
                return Err(nothing_to_update());
            }
            if let Some(price) = changes.price {
                validation::validate_positive_price("price", price)?;
            }
            let updated = api.update(&id, &changes).await?;
            ctx.notifier.success("Transaction updated");
            print_record(&updated);
        }
        TransactionCommands::Delete { id, page } => {
            delete_record::<Transaction>(ctx, &id, page).await?
        }
    }
    Ok(())
}

async fn handle_dashboard(ctx: &AppContext) -> Result<(), AppError> {
    let stats = DashboardService::new(&ctx.client).load().await;

    println!("Dashboard:");
    println!("  Properties:   {}", stats.counts.properties);
    println!("  Leads:        {}", stats.counts.leads);
    println!("  Agents:       {}", stats.counts.agents);
    println!("  Transactions: {}", stats.counts.transactions);

    if !stats.lead_statuses.is_empty() {
        println!("Lead status:");
        for slice in &stats.lead_statuses {
            println!("  {:<12} {}", slice.name, slice.value);
        }
    }
    if !stats.transaction_trend.is_empty() {
        println!("Transactions per month:");
        for month in &stats.transaction_trend {
            println!("  {:<10} {}", month.month, month.transactions);
        }
    }
    Ok(())
}

pub fn handle_config_validate(config: &Config) -> Result<(), AppError> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  API URL: {}", config.api_url);
    println!("  Storage: {}", config.storage_path.display());
    println!("  Page size: {}", config.page_size);
    println!("  HTTP timeout: {}s", config.http_timeout_secs);
    println!(
        "  Circuit breaker: {} failures, {}s reset",
        config.circuit_failures, config.circuit_reset_secs
    );
    println!("  Log format: {:?}", config.log_format);

    println!("✓ Configuration is valid");
    Ok(())
}

async fn delete_record<R>(ctx: &AppContext, id: &str, page: usize) -> Result<(), AppError>
where
    R: Resource + TableRow,
{
    let mut list = RecordList::<R>::load(&ctx.client, ctx.config.page_size).await?;
    turn_to(ctx, list.pages_mut(), page);
    let message = list.delete(&ctx.client, id).await?;
    ctx.notifier.success(&message);
    print_page(list.pages());
    Ok(())
}

fn nothing_to_update() -> AppError {
    ValidationError::new("changes", "at least one field must be given").into()
}

/// Out-of-range pages are reported and the first page is shown instead.
fn turn_to<T>(ctx: &AppContext, pages: &mut Paginator<T>, page: usize) {
    if page != pages.current_page() && !pages.go_to(page) {
        ctx.notifier.error(&format!(
            "Page {} does not exist; showing page {}",
            page,
            pages.current_page()
        ));
    }
}

fn print_page<R: TableRow>(pages: &Paginator<R>) {
    if pages.is_empty() {
        println!("No records found");
        return;
    }

    println!("{}", R::HEADER);
    println!("{}", "-".repeat(R::HEADER.len()));
    for record in pages.page_items() {
        println!("{}", record.row());
    }
    println!(
        "Page {} of {} ({} records)",
        pages.current_page(),
        pages.total_pages(),
        pages.len()
    );
}

fn print_record<R: serde::Serialize>(record: &R) {
    match serde_json::to_string_pretty(record) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to render record: {}", e),
    }
}

trait TableRow {
    const HEADER: &'static str;

    fn row(&self) -> String;
}

impl TableRow for Property {
    const HEADER: &'static str =
        "Id                        Title                          City             Price        Agent";

    fn row(&self) -> String {
        format!(
            "{:<25} {:<30} {:<16} {:<12.2} {}",
            self.id,
            truncate(&self.title, 30),
            truncate(&self.city, 16),
            self.price,
            self.assigned_to.as_deref().filter(|a| !a.is_empty()).unwrap_or("-")
        )
    }
}

impl TableRow for Agent {
    const HEADER: &'static str =
        "Id                        Name                           Email                          Properties Active";

    fn row(&self) -> String {
        format!(
            "{:<25} {:<30} {:<30} {:<10} {}",
            self.id,
            truncate(&self.name, 30),
            truncate(&self.email, 30),
            self.assigned_properties.len(),
            if self.active() { "yes" } else { "no" }
        )
    }
}

impl TableRow for Lead {
    const HEADER: &'static str =
        "Id                        Name                      Email                          Property     Status";

    fn row(&self) -> String {
        format!(
            "{:<25} {:<25} {:<30} {:<12} {}",
            self.id.as_deref().unwrap_or("-"),
            truncate(&self.name, 25),
            truncate(&self.email, 30),
            truncate(&self.property_ref, 12),
            self.effective_status()
        )
    }
}

impl TableRow for Transaction {
    const HEADER: &'static str =
        "Id                        Client           Agent            Property     Price        Status";

    fn row(&self) -> String {
        format!(
            "{:<25} {:<16} {:<16} {:<12} {:<12.2} {}",
            self.id.as_deref().unwrap_or("-"),
            truncate(&self.client, 16),
            truncate(&self.agent, 16),
            truncate(&self.property_ref, 12),
            self.price,
            self.status.as_str()
        )
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut shortened: String = value.chars().take(width.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_login() {
        let cli = Cli::try_parse_from([
            "estate-desk",
            "login",
            "--email",
            "ada@example.com",
            "--password",
            "pw",
            "--role",
            "admin",
        ])
        .unwrap();
        match cli.command {
            Commands::Login { role, .. } => assert_eq!(role, Role::Admin),
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_rejects_unknown_role() {
        let result = Cli::try_parse_from([
            "estate-desk",
            "login",
            "--email",
            "a@b.co",
            "--password",
            "pw",
            "--role",
            "Admin",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parses_lead_filter() {
        let cli = Cli::try_parse_from([
            "estate-desk",
            "leads",
            "list",
            "--search",
            "ada",
            "--status",
            "qualified",
        ])
        .unwrap();
        match cli.command {
            Commands::Leads(LeadCommands::List { search, status, page }) => {
                assert_eq!(search, "ada");
                assert_eq!(status, StatusFilter::Only(LeadStatus::Qualified));
                assert_eq!(page, 1);
            }
            _ => panic!("expected leads list"),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long title", 6), "a lon…");
    }
}
