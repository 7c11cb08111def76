/**
 * Portal CLI - Main Entry Point
 *
 * Drives the client library from a terminal: restores the saved session,
 * then runs one command against the platform API.
 */
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rehab_portal::client::orders::{format_amount, SortDirection};
use rehab_portal::client::products::{PRODUCT_LOAD_FAILED, PRODUCT_UPDATED, PRODUCT_UPDATE_FAILED};
use rehab_portal::client::{
    status_steps, Config, ContactMethod, ForgotPasswordRequest, ImageUpload, LoggingNavigator,
    LoginCredentials, Notification, NotificationKind, Notifier, OrderStatus, ProductForm,
    Registration, RentalFilter, ResetPasswordRequest, SessionManager, StepState, StorageTier,
    TeamMemberForm,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "portal", version, about = "Rehab portal API client")]
struct Cli {
    /// API base URL (overrides PORTAL_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Restore the saved session and show who is signed in
    Status,
    /// Log in with email (or phone with --phone)
    Login {
        identifier: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
        /// Treat the identifier as a phone number
        #[arg(long)]
        phone: bool,
        /// Keep the credentials after this process exits
        #[arg(long)]
        remember: bool,
    },
    /// Create an account, optionally verifying it in the same run
    Register {
        #[arg(long)]
        name: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        remember: bool,
        /// Verification code, if already received
        #[arg(long)]
        code: Option<String>,
        /// Ask for a new code instead of verifying
        #[arg(long, conflicts_with = "code")]
        resend: bool,
    },
    /// Request a password reset code
    ForgotPassword {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Set a new password with a reset code
    ResetPassword {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        otp: String,
        #[arg(long, env = "PORTAL_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show an order and its status stepper
    Order { id: String },
    /// Show a product as the editor would prefill it
    Product { id: String },
    /// Edit a product; unset fields keep their current values
    EditProduct {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// BUY or RENT
        #[arg(long = "type")]
        product_type: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated, one per variant
        #[arg(long)]
        stock: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        weight: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Image file; repeat for each picture
        #[arg(long = "image", required = true)]
        images: Vec<PathBuf>,
    },
    /// List clinic locations
    Locations,
    /// Add a team member
    AddTeamMember {
        #[arg(long)]
        name: String,
        #[arg(long)]
        position: String,
        /// Location id (see `portal locations`)
        #[arg(long)]
        location: String,
        #[arg(long)]
        specialty: String,
        #[arg(long)]
        picture: PathBuf,
    },
    /// List rental orders
    Rentals {
        /// Status filter, or "all"
        #[arg(long)]
        status: Option<String>,
        /// "asc" or "desc"
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

/// Prints toasts to the terminal
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => println!("✓ {}", notification.message),
            NotificationKind::Error => eprintln!("✗ {}", notification.message),
        }
    }
}

fn contact(email: Option<String>, phone: Option<String>) -> Result<ContactMethod, String> {
    match (email, phone) {
        (Some(email), None) => Ok(ContactMethod::Email(email)),
        (None, Some(phone)) => Ok(ContactMethod::Phone(phone)),
        _ => Err("pass exactly one of --email or --phone".to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::load(cli.api_url)?;
    tracing::info!("Using API at {}", config.server_url());

    let manager = SessionManager::from_config(
        config,
        Arc::new(ConsoleNotifier),
        Arc::new(LoggingNavigator),
    )?;
    manager.initialize_auth().await;

    match cli.command {
        Command::Status => {
            let session = manager.store().snapshot();
            match session.user() {
                Some(user) if session.is_authenticated() => println!(
                    "Signed in as {} ({})",
                    user.name.as_deref().unwrap_or("unnamed user"),
                    user.id
                ),
                _ => println!("Not signed in"),
            }
        }
        Command::Login {
            identifier,
            password,
            phone,
            remember,
        } => {
            let credentials = LoginCredentials::new(identifier, password, remember);
            if phone {
                manager.login_with_phone(credentials).await;
            } else {
                manager.login(credentials).await;
            }
            if !remember && manager.store().is_authenticated() {
                println!("Session kept in memory only; pass --remember to save it.");
            }
        }
        Command::Register {
            name,
            password,
            email,
            phone,
            remember,
            code,
            resend,
        } => {
            let registration = Registration::from_form(
                &name,
                &password,
                email.as_deref(),
                phone.as_deref(),
                remember,
            )?;
            let by_phone = matches!(registration.contact, ContactMethod::Phone(_));
            manager.register_user(registration).await;

            if manager.store().snapshot().is_pending_verification() {
                match (code, by_phone) {
                    (Some(code), false) => manager.verify_email(&code).await,
                    (Some(code), true) => manager.verify_phone(&code).await,
                    (None, false) if resend => manager.resend_email().await,
                    (None, true) if resend => manager.resend_phone().await,
                    (None, _) => {}
                }
            }
        }
        Command::ForgotPassword { email, phone } => {
            let request = ForgotPasswordRequest {
                contact: contact(email, phone)?,
            };
            if manager.forgot_password(request).await {
                println!("Run `portal reset-password` with the code you received.");
            }
        }
        Command::ResetPassword {
            email,
            phone,
            otp,
            password,
        } => {
            let request = ResetPasswordRequest {
                contact: contact(email, phone)?,
                otp,
                password,
            };
            manager.reset_password(request).await;
        }
        Command::Logout => manager.logout_user(),
        Command::Order { id } => {
            let token = manager.store().snapshot().token().map(str::to_string);
            let order = manager.api().fetch_order(&id, token.as_deref()).await?;
            println!("Order #{} - {}", order.id, order.order_status);
            for step in status_steps(order.status()) {
                let marker = match step.state {
                    StepState::Completed => "●",
                    StepState::Current => "◉",
                    StepState::Pending => "○",
                };
                println!("  {} {}", marker, step.status.label());
            }
            println!("Total: $ {}", format_amount(order.total));
            for (currency, amount) in order.converted_totals() {
                println!("       {} {}", currency, format_amount(amount));
            }
        }
        Command::Product { id } => {
            let token = manager.store().snapshot().token().map(str::to_string);
            let product = match manager.api().fetch_product(&id, token.as_deref()).await {
                Ok(product) => product,
                Err(e) => {
                    tracing::warn!("[PRODUCTS] Could not load product {}: {}", id, e);
                    ConsoleNotifier.notify(Notification::error(PRODUCT_LOAD_FAILED));
                    return Ok(());
                }
            };
            let form = ProductForm::from_product(&product);
            println!("{} ({})", form.name, form.product_type);
            if let Some(category) = &product.category {
                println!("  category: {} ({})", category.name, category.id);
            }
            println!("  stock:    {}", form.stock);
            println!("  price:    {}", form.price);
            println!("  weight:   {}", form.weight);
            println!("  {}", form.description);
        }
        Command::EditProduct {
            id,
            name,
            product_type,
            category,
            stock,
            price,
            weight,
            description,
            images,
        } => {
            let token = manager.store().snapshot().token().map(str::to_string);
            let product = manager.api().fetch_product(&id, token.as_deref()).await?;
            let mut form = ProductForm::from_product(&product);
            let overrides = [
                (&mut form.name, name),
                (&mut form.product_type, product_type),
                (&mut form.category_id, category),
                (&mut form.stock, stock),
                (&mut form.price, price),
                (&mut form.weight, weight),
                (&mut form.description, description),
            ];
            for (field, value) in overrides {
                if let Some(value) = value {
                    *field = value;
                }
            }

            let mut uploads = Vec::with_capacity(images.len());
            for path in &images {
                uploads.push(ImageUpload::read(path).await?);
            }
            let update = form.validate(uploads)?;
            match manager
                .api()
                .update_product(&id, &update, token.as_deref())
                .await
            {
                Ok(_) => ConsoleNotifier.notify(Notification::success(PRODUCT_UPDATED)),
                Err(e) => {
                    tracing::warn!("[PRODUCTS] Update of {} failed: {}", id, e);
                    ConsoleNotifier.notify(Notification::error(PRODUCT_UPDATE_FAILED));
                }
            }
        }
        Command::Locations => {
            let token = manager.store().snapshot().token().map(str::to_string);
            for location in manager.api().fetch_locations(token.as_deref()).await? {
                println!("  {:>4}  {}", location.id, location.name);
            }
        }
        Command::AddTeamMember {
            name,
            position,
            location,
            specialty,
            picture,
        } => {
            let member = TeamMemberForm {
                name,
                position,
                location_id: location,
                specialty,
                picture: Some(ImageUpload::read(&picture).await?),
            }
            .validate()?;
            let token = manager.store().snapshot().token().map(str::to_string);
            manager
                .api()
                .create_team_member(&member, token.as_deref())
                .await?;
            println!("Added {} to the team.", member.name);
        }
        Command::Rentals { status, sort, page } => {
            let prefs = manager.credentials().tier(StorageTier::Volatile);
            let mut filter = RentalFilter::from_preferences(prefs);
            filter.page = page;
            if let Some(status) = status {
                filter.status = match status.as_str() {
                    "all" => None,
                    other => Some(other.parse::<OrderStatus>()?),
                };
            }
            if let Some(sort) = sort {
                filter.sort = sort.parse::<SortDirection>()?;
            }
            filter.save_preferences(prefs)?;

            let token = manager.store().snapshot().token().map(str::to_string);
            let result = manager.api().filter_rentals(&filter, token.as_deref()).await?;
            println!(
                "Page {} of {} ({} rentals)",
                filter.page,
                filter.page_count(result.total).max(1),
                result.total
            );
            for rental in result.data {
                let label = rental
                    .status()
                    .map(OrderStatus::label)
                    .unwrap_or_else(|| rental.status.clone());
                println!("  #{} {}", rental.id, label);
            }
        }
    }

    Ok(())
}
