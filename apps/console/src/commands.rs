use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use client_core::{
    dashboard::{ChartSeries, DashboardView},
    validation::{LoginForm, PaymentForm, ProfileForm, RegisterForm, SiteForm},
    AnalyticsOverview, AppBarAction, AppBarState, ClientError, ConsoleClient, CycleOutcome,
    DashboardError, GateDecision, ListSlot, PaymentFilter, Route,
};
use regions::{RegionCatalog, SelectMode, SelectionState};
use shared::{
    domain::{AccountType, GigId, SiteId},
    protocol::{ComparativeStats, Delta, Gig, Site, UserProfile},
};

const CHART_WIDTH: f64 = 24.0;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and keep the session on disk.
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to the password.
        #[arg(long)]
        confirm_password: Option<String>,
        /// Register a worker account instead of a supervisor.
        #[arg(long)]
        worker: bool,
    },
    Whoami,
    Dashboard {
        #[arg(long)]
        all_gigs: bool,
        #[arg(long)]
        all_sites: bool,
        #[arg(long)]
        all_workers: bool,
    },
    /// Contractor analytics; without a report, the overview screen.
    Analytics {
        #[arg(long, value_enum)]
        report: Option<AnalyticsReport>,
    },
    #[command(subcommand)]
    Sites(SitesCommand),
    #[command(subcommand)]
    Gigs(GigsCommand),
    #[command(subcommand)]
    Payments(PaymentsCommand),
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Browse the county / constituency / ward hierarchy.
    Regions {
        county: Option<String>,
        constituency: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalyticsReport {
    Workers,
    JobTypes,
    Organizations,
    Revenue,
    Location,
    Retention,
}

#[derive(Subcommand, Debug)]
pub enum SitesCommand {
    List,
    Add {
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        location: LocationArgs,
    },
    /// Unset fields keep the site's current values.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        location: LocationArgs,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum GigsCommand {
    Unverified,
    Verify { id: i64 },
    Organizations,
    /// Gigs logged against one organization.
    ForSite { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum PaymentsCommand {
    List {
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        receipt: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Send an M-Pesa STK push to a phone.
    Push { phone: String, amount: String },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    Show,
    Update {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        national_id: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[command(flatten)]
        location: LocationArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct LocationArgs {
    #[arg(long)]
    county: Option<String>,
    #[arg(long)]
    constituency: Option<String>,
    #[arg(long)]
    ward: Option<String>,
}

impl LocationArgs {
    /// Applies the given components on top of `selection` as user edits, so a
    /// new county drops the old constituency and ward.
    fn apply(&self, catalog: &RegionCatalog, selection: &mut SelectionState) -> Result<()> {
        if let Some(county) = &self.county {
            selection.select_region(catalog, county, SelectMode::UserEdit);
            if selection.region().is_empty() {
                bail!("unknown county {county:?}");
            }
        }
        if let Some(constituency) = &self.constituency {
            selection.select_sub_region(catalog, constituency, SelectMode::UserEdit);
            if selection.sub_region().is_empty() {
                bail!(
                    "{constituency:?} is not a constituency of {:?}",
                    selection.region()
                );
            }
        }
        if let Some(ward) = &self.ward {
            if !selection.select_ward(ward) {
                bail!(
                    "{ward:?} is not a ward of {:?}",
                    selection.sub_region()
                );
            }
        }
        Ok(())
    }
}

impl Command {
    fn route(&self) -> Option<Route> {
        match self {
            Command::Login { .. } | Command::Logout => Some(Route::Login),
            Command::Register { .. } => Some(Route::Register),
            Command::Whoami | Command::Profile(_) => Some(Route::Profile),
            Command::Dashboard { .. } => Some(Route::Dashboard),
            Command::Analytics { .. } => Some(Route::Analytics),
            Command::Sites(_) => Some(Route::Sites),
            Command::Gigs(GigsCommand::Organizations) => Some(Route::Workers),
            Command::Gigs(_) => Some(Route::VerifyGigs),
            Command::Payments(_) => Some(Route::Payments),
            Command::Regions { .. } => None,
        }
    }
}

fn screen_actions(route: Route) -> Vec<AppBarAction> {
    match route {
        Route::Dashboard | Route::Analytics => {
            vec![AppBarAction::new("refresh", "refresh", "Refresh")]
        }
        Route::Sites => vec![AppBarAction::new("add-site", "plus", "Add site")],
        Route::VerifyGigs => vec![AppBarAction::new("refresh", "refresh", "Refresh")],
        Route::Payments => vec![AppBarAction::new("stk-push", "phone", "Request payment")],
        _ => Vec::new(),
    }
}

pub async fn run(client: &ConsoleClient, catalog: &RegionCatalog, command: Command) -> Result<()> {
    let route = command.route();
    if let Some(route) = route {
        if let GateDecision::Redirect(target) = client.guard(route).await {
            bail!(
                "{} needs a signed-in session; run `fundi login` first ({})",
                route.title(),
                target.path()
            );
        }
    }

    let _screen = route.map(|route| {
        let guard = client.app_bar().activate(AppBarState {
            title: route.title().to_string(),
            show_back: route.requires_session() && route != Route::Dashboard,
            actions: screen_actions(route),
        });
        print_header(&client.app_bar().snapshot());
        guard
    });

    execute(client, catalog, command).await.map_err(explain)
}

async fn execute(client: &ConsoleClient, catalog: &RegionCatalog, command: Command) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            client.auth.login(LoginForm { username, password }).await?;
            println!("Signed in.");
        }
        Command::Logout => {
            let result = client.auth.logout().await;
            println!("Signed out.");
            result?;
        }
        Command::Register {
            username,
            email,
            confirm_password,
            password,
            worker,
        } => {
            let form = RegisterForm {
                username,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
                account_type: if worker {
                    AccountType::Worker
                } else {
                    AccountType::Supervisor
                },
            };
            let ack = client.auth.register(form).await?;
            println!(
                "{}",
                ack.message
                    .as_deref()
                    .unwrap_or("Account created. Check your email to activate it.")
            );
        }
        Command::Whoami => {
            let profile = client.users.profile().await?;
            println!("{} ({})", display_name(&profile), text(&profile.email));
        }
        Command::Dashboard {
            all_gigs,
            all_sites,
            all_workers,
        } => dashboard(client, all_gigs, all_sites, all_workers).await?,
        Command::Analytics { report } => analytics(client, report).await?,
        Command::Sites(command) => sites(client, catalog, command).await?,
        Command::Gigs(command) => gigs(client, command).await?,
        Command::Payments(command) => payments(client, command).await?,
        Command::Profile(command) => profile(client, catalog, command).await?,
        Command::Regions {
            county,
            constituency,
        } => browse_regions(catalog, county.as_deref(), constituency.as_deref())?,
    }
    Ok(())
}

async fn dashboard(
    client: &ConsoleClient,
    all_gigs: bool,
    all_sites: bool,
    all_workers: bool,
) -> Result<()> {
    let orchestrator = client.dashboard();
    for (wanted, list) in [
        (all_gigs, ListSlot::RecentGigs),
        (all_sites, ListSlot::TopSites),
        (all_workers, ListSlot::TopWorkers),
    ] {
        if wanted {
            orchestrator.toggle_expand(list).await;
        }
    }

    let view = match orchestrator.load_all().await? {
        CycleOutcome::Committed(view) => view,
        CycleOutcome::Superseded => orchestrator
            .snapshot()
            .await
            .context("dashboard has no data yet")?,
    };
    print_dashboard(&view);
    Ok(())
}

fn print_dashboard(view: &DashboardView) {
    if let Some(profile) = &view.profile {
        println!("Welcome back, {}", display_name(profile));
    }

    let stats = &view.summary;
    println!(
        "Gigs {}  Unverified {}  Workers {}  Sites {}  Verified this week {}",
        stats.total_gigs,
        stats.unverified_gigs,
        stats.active_workers,
        stats.active_sites,
        stats.verified_this_week
    );
    println!(
        "Verification rate {:.1}%  Avg verification time {:.1}h",
        stats.verification_rate, stats.avg_verification_time
    );

    println!("\nRecent gigs");
    for gig in view.recent_gigs.visible() {
        let mark = if gig.verified { "verified" } else { "pending" };
        println!(
            "  #{:<5} {:<20} {:<20} {:<12} {} [{mark}]",
            gig.id, gig.worker_name, gig.site_name, gig.job_type, gig.date
        );
    }
    more_hint(view.recent_gigs.all().len(), view.recent_gigs.visible().len(), "--all-gigs");

    println!("\nTop sites");
    for site in view.top_sites.visible() {
        println!(
            "  {:<24} workers {:<4} gigs {:<4} completion {:.0}%",
            site.name, site.workers, site.gigs, site.completion
        );
    }
    more_hint(view.top_sites.all().len(), view.top_sites.visible().len(), "--all-sites");

    println!("\nTop workers");
    for worker in view.top_workers.visible() {
        println!(
            "  {:>2}. {:<24} gigs {:<4} rating {:.1}",
            worker.rank, worker.name, worker.gigs, worker.rating
        );
    }
    more_hint(
        view.top_workers.all().len(),
        view.top_workers.visible().len(),
        "--all-workers",
    );

    println!("\nThis week");
    print_chart(&view.chart);

    if !view.trends.is_empty() {
        println!("\nGig trend");
        print_chart(&view.trend_chart);
    }
    if let Some(comparative) = &view.comparative {
        println!("\nAgainst the previous period");
        print_comparative(comparative);
    }
}

async fn analytics(client: &ConsoleClient, report: Option<AnalyticsReport>) -> Result<()> {
    let api = &client.analytics;
    let Some(report) = report else {
        print_overview(&api.overview().await?);
        return Ok(());
    };

    match report {
        AnalyticsReport::Workers => {
            for worker in api.worker_performance().await? {
                println!(
                    "  {:<24} gigs {:<4} verified {:<4} rating {:.1}",
                    worker.name, worker.gigs, worker.verified_gigs, worker.rating
                );
            }
        }
        AnalyticsReport::JobTypes => {
            for share in api.job_types().await? {
                println!("  {:<20} gigs {:<4} {:.1}%", share.job_type, share.gigs, share.percentage);
            }
        }
        AnalyticsReport::Organizations => {
            for organization in api.organization_performance().await? {
                println!(
                    "  {:<24} gigs {:<4} workers {:<4} completion {:.0}%",
                    organization.name,
                    organization.gigs,
                    organization.workers,
                    organization.completion_rate
                );
            }
        }
        AnalyticsReport::Revenue => {
            for point in api.revenue().await? {
                println!("  {:<10} KES {}", point.period, point.amount);
            }
        }
        AnalyticsReport::Location => {
            for share in api.location().await? {
                println!("  {:<20} gigs {:<4} workers {}", share.county, share.gigs, share.workers);
            }
        }
        AnalyticsReport::Retention => {
            for point in api.worker_retention().await? {
                println!(
                    "  {:<10} active {:<4} returning {:<4} retention {:.1}%",
                    point.period, point.active_workers, point.returning_workers, point.retention_rate
                );
            }
        }
    }
    Ok(())
}

fn print_overview(overview: &AnalyticsOverview) {
    let summary = &overview.summary;
    println!(
        "Gigs {}  Verified {}  Workers {}  Sites {}  Revenue KES {}",
        summary.total_gigs,
        summary.verified_gigs,
        summary.total_workers,
        summary.total_sites,
        summary.total_revenue
    );
    let verification = &overview.verification;
    println!(
        "Verification rate {:.1}%  Pending {}  Avg verification time {:.1}h",
        verification.verification_rate, verification.unverified, verification.avg_verification_time
    );

    println!("\nGig trend");
    print_chart(&ChartSeries::from_trends(&overview.trends));

    println!("\nAgainst the previous period");
    print_comparative(&overview.comparative);

    println!("\nJob types");
    for share in &overview.job_types {
        println!("  {:<20} {:.1}%", share.job_type, share.percentage);
    }
}

fn print_comparative(stats: &ComparativeStats) {
    for (label, delta) in [
        ("Gigs", stats.gigs()),
        ("Verified", stats.verified()),
        ("Workers", stats.workers()),
        ("Revenue", stats.revenue()),
    ] {
        println!("  {label:<10} {}", format_delta(delta));
    }
}

fn format_delta(delta: Delta) -> String {
    match delta.percent {
        Some(percent) => format!("{:+} ({percent:+.1}%)", delta.absolute),
        None => format!("{:+}", delta.absolute),
    }
}

fn more_hint(total: usize, visible: usize, flag: &str) {
    if total > visible {
        println!("  ... {} more ({flag})", total - visible);
    }
}

fn print_chart(chart: &ChartSeries) {
    for point in &chart.points {
        let width = (chart.ratio(point.value) * CHART_WIDTH).round() as usize;
        println!("  {:<4} {:<24} {}", point.label, "#".repeat(width), point.value);
    }
}

async fn sites(client: &ConsoleClient, catalog: &RegionCatalog, command: SitesCommand) -> Result<()> {
    match command {
        SitesCommand::List => {
            for site in client.sites.list().await? {
                print_site(&site);
            }
        }
        SitesCommand::Add {
            name,
            phone,
            description,
            location,
        } => {
            let mut selection = SelectionState::new();
            location.apply(catalog, &mut selection)?;
            let site = client
                .sites
                .create(SiteForm {
                    name,
                    description: description.unwrap_or_default(),
                    phone_number: phone,
                    location: selection,
                })
                .await?;
            print_site(&site);
        }
        SitesCommand::Update {
            id,
            name,
            phone,
            description,
            location,
        } => {
            let id = SiteId(id);
            let current = client
                .sites
                .list()
                .await?
                .into_iter()
                .find(|site| site.id == id)
                .ok_or_else(|| anyhow!("no site with id {id}"))?;

            let mut selection = SelectionState::restore(catalog, &current.location);
            location.apply(catalog, &mut selection)?;
            let site = client
                .sites
                .update(
                    id,
                    SiteForm {
                        name: name.unwrap_or(current.name),
                        description: description.unwrap_or(current.description),
                        phone_number: phone.unwrap_or(current.phone_number),
                        location: selection,
                    },
                )
                .await?;
            print_site(&site);
        }
        SitesCommand::Delete { id } => {
            client.sites.delete(SiteId(id)).await?;
            println!("Deleted site {id}.");
        }
    }
    Ok(())
}

async fn gigs(client: &ConsoleClient, command: GigsCommand) -> Result<()> {
    match command {
        GigsCommand::Unverified => {
            let gigs = client.contractor.unverified_gigs().await?;
            if gigs.is_empty() {
                println!("Nothing waiting for verification.");
            }
            gigs.iter().for_each(print_gig);
        }
        GigsCommand::Verify { id } => {
            client.gigs.verify(GigId(id)).await?;
            println!("Gig {id} verified.");
        }
        GigsCommand::Organizations => {
            for site in client.contractor.organizations().await? {
                print_site(&site);
            }
        }
        GigsCommand::ForSite { id } => {
            client
                .contractor
                .organization_gigs(SiteId(id))
                .await?
                .iter()
                .for_each(print_gig);
        }
    }
    Ok(())
}

async fn payments(client: &ConsoleClient, command: PaymentsCommand) -> Result<()> {
    match command {
        PaymentsCommand::List {
            phone,
            amount,
            receipt,
            from,
            to,
        } => {
            let records = client.payments.records().await?;
            let filter = PaymentFilter {
                phone,
                amount,
                receipt,
                start: from,
                end: to,
            };
            let matching = filter.apply(&records);
            for record in &matching {
                println!(
                    "  {:<12} {:<14} KES {:<10} {} {}",
                    record.mpesa_receipt_number,
                    record.phone_number,
                    record.amount,
                    record.transaction_date.format("%Y-%m-%d %H:%M"),
                    record.status
                );
            }
            println!("{} of {} payments", matching.len(), records.len());
        }
        PaymentsCommand::Push { phone, amount } => {
            let response = client
                .payments
                .push(PaymentForm {
                    phone_number: phone,
                    amount,
                })
                .await?;
            println!(
                "{}",
                response
                    .message
                    .as_deref()
                    .unwrap_or("Payment request sent. Ask the customer to enter their PIN.")
            );
        }
    }
    Ok(())
}

async fn profile(
    client: &ConsoleClient,
    catalog: &RegionCatalog,
    command: ProfileCommand,
) -> Result<()> {
    match command {
        ProfileCommand::Show => print_profile(&client.users.profile().await?),
        ProfileCommand::Update {
            full_name,
            national_id,
            phone,
            location,
        } => {
            let current = client.users.profile().await?;
            let mut form = ProfileForm::from_profile(&current, catalog);
            if let Some(full_name) = full_name {
                form.full_name = full_name;
            }
            if let Some(national_id) = national_id {
                form.national_id = national_id;
            }
            if let Some(phone) = phone {
                form.phone = phone;
            }
            location.apply(catalog, &mut form.location)?;
            print_profile(&client.users.update_profile(form).await?);
        }
    }
    Ok(())
}

fn browse_regions(
    catalog: &RegionCatalog,
    county: Option<&str>,
    constituency: Option<&str>,
) -> Result<()> {
    let Some(county) = county else {
        for region in catalog.regions() {
            println!("  {:>3} {}", region.code, region.name);
        }
        return Ok(());
    };

    let mut selection = SelectionState::new();
    selection.select_region(catalog, county, SelectMode::Prefill);
    if !selection.sub_region_enabled() {
        bail!("unknown county {county:?}");
    }

    let Some(constituency) = constituency else {
        selection
            .sub_region_options()
            .iter()
            .for_each(|name| println!("  {name}"));
        return Ok(());
    };

    selection.select_sub_region(catalog, constituency, SelectMode::Prefill);
    if !selection.ward_enabled() {
        bail!("{constituency:?} is not a constituency of {county:?}");
    }
    selection
        .ward_options()
        .iter()
        .for_each(|ward| println!("  {ward}"));
    Ok(())
}

fn print_header(bar: &AppBarState) {
    let back = if bar.show_back { "< " } else { "" };
    let actions: Vec<&str> = bar.actions.iter().map(|action| action.label.as_str()).collect();
    if actions.is_empty() {
        println!("{back}{}", bar.title);
    } else {
        println!("{back}{}    [{}]", bar.title, actions.join("] ["));
    }
}

fn print_site(site: &Site) {
    println!(
        "  #{:<5} {:<28} {:<14} {}",
        site.id, site.name, site.phone_number, site.location
    );
}

fn print_gig(gig: &Gig) {
    let amount = gig
        .amount_paid
        .as_ref()
        .map(|amount| format!("KES {amount}"))
        .unwrap_or_else(|| "-".into());
    println!(
        "  #{:<5} {} {:<18} {:<10} {:<10} {}",
        gig.id,
        gig.start_date,
        gig.client_name,
        gig.status().label(),
        amount,
        gig.location
    );
}

fn print_profile(profile: &UserProfile) {
    println!("Name         {}", display_name(profile));
    println!("Email        {}", text(&profile.email));
    println!("Phone        {}", text(&profile.phone));
    println!("National ID  {}", text(&profile.national_id));
    println!(
        "Location     {}, {}, {}",
        text(&profile.ward),
        text(&profile.constituency),
        text(&profile.county)
    );
}

fn display_name(profile: &UserProfile) -> &str {
    profile
        .full_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(&profile.username)
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

/// Turns session and verification failures into instructions.
fn explain(err: anyhow::Error) -> anyhow::Error {
    let unauthorized = err
        .downcast_ref::<ClientError>()
        .is_some_and(ClientError::is_unauthorized)
        || err
            .downcast_ref::<DashboardError>()
            .is_some_and(DashboardError::is_unauthorized);
    if unauthorized {
        return err.context("your session has ended; run `fundi login` again");
    }

    if err
        .downcast_ref::<ClientError>()
        .is_some_and(ClientError::is_retryable)
    {
        return err.context("the request did not go through; run the command again");
    }

    if let Some(ClientError::EmailNotVerified { email, .. }) = err.downcast_ref::<ClientError>() {
        let target = email.as_deref().unwrap_or("your inbox");
        let hint = format!("open the activation link sent to {target}, then sign in again");
        return err.context(hint);
    }
    err
}
