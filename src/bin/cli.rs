use clap::{Parser, Subcommand};
use pdfnotes::{
    config::AppConfig,
    db,
    models::user::Role,
    repositories::user_repository::SqliteUserRepository,
    services::{
        user_service::{CreateUserRequest, UserService},
        ConsoleEmailService, TokenService,
    },
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pdfnotes-cli")]
#[command(about = "CLI tool for managing PDF Notes users", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Full name
        #[arg(short, long)]
        fullname: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,

        /// Mark email as verified
        #[arg(long)]
        verified: bool,

        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },

    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Delete a user
    Delete {
        /// Email address of the user to delete
        #[arg(short, long)]
        email: String,
    },

    /// Verify a user's email
    Verify {
        /// Email address of the user to verify
        #[arg(short, long)]
        email: String,
    },

    /// Change a user's role
    Promote {
        /// Email address of the user
        #[arg(short, long)]
        email: String,

        /// Revert the user to the regular role instead
        #[arg(long)]
        demote: bool,
    },
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

fn fail(message: String) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    // Initialize services
    let user_service = UserService::new(
        Arc::new(SqliteUserRepository::new(pool)),
        Arc::new(ConsoleEmailService::new()),
        Arc::new(TokenService::new(&config.jwt_secret)),
        config.base_url.clone(),
    );

    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::Create {
                email,
                fullname,
                password,
                verified,
                admin,
            } => {
                let password = match password {
                    Some(pw) => pw,
                    None => {
                        let password = get_password("Password")?;
                        if password != get_password("Confirm password")? {
                            fail("Passwords do not match".to_string());
                        }
                        password
                    }
                };

                let request = CreateUserRequest {
                    fullname,
                    email,
                    password,
                    is_verified: verified,
                    role: if admin { Role::Admin } else { Role::User },
                };

                match user_service.create_user(request).await {
                    Ok(user) => {
                        println!("✅ User created successfully!");
                        println!("  ID: {}", user.id);
                        println!("  Email: {}", user.email);
                        println!("  Username: {}", user.username);
                        println!("  Verified: {}", user.is_verified);
                        println!("  Role: {}", user.role.as_str());
                    }
                    Err(err) => fail(format!("Failed to create user: {}", err)),
                }
            }

            UserCommands::List { limit, offset } => {
                match user_service.list_users(Some(limit), Some(offset)).await {
                    Ok(users) if users.is_empty() => println!("No users found."),
                    Ok(users) => {
                        println!(
                            "{:<5} {:<35} {:<20} {:<9} {:<6} {:<20}",
                            "ID", "Email", "Username", "Verified", "Role", "Created"
                        );
                        println!("{}", "-".repeat(98));
                        for user in users {
                            println!(
                                "{:<5} {:<35} {:<20} {:<9} {:<6} {:<20}",
                                user.id,
                                user.email,
                                user.username,
                                if user.is_verified { "Yes" } else { "No" },
                                user.role.as_str(),
                                user.created_at.as_deref().unwrap_or("N/A")
                            );
                        }
                    }
                    Err(err) => fail(format!("Failed to list users: {}", err)),
                }
            }

            UserCommands::Delete { email } => match user_service.find_user_by_email(&email).await {
                Ok(Some(user)) => match user_service.delete_user(user.id).await {
                    Ok(()) => println!("✅ User '{}' deleted successfully!", email),
                    Err(err) => fail(format!("Failed to delete user: {}", err)),
                },
                Ok(None) => fail(format!("User '{}' not found", email)),
                Err(err) => fail(format!("Failed to find user: {}", err)),
            },

            UserCommands::Verify { email } => match user_service.find_user_by_email(&email).await {
                Ok(Some(user)) if user.is_verified => {
                    println!("ℹ️  User '{}' is already verified", email);
                }
                Ok(Some(user)) => match user_service.mark_verified(user.id).await {
                    Ok(_) => println!("✅ User '{}' email verified successfully!", email),
                    Err(err) => fail(format!("Failed to verify user: {}", err)),
                },
                Ok(None) => fail(format!("User '{}' not found", email)),
                Err(err) => fail(format!("Failed to find user: {}", err)),
            },

            UserCommands::Promote { email, demote } => {
                let role = if demote { Role::User } else { Role::Admin };
                match user_service.find_user_by_email(&email).await {
                    Ok(Some(user)) => match user_service.set_role(user.id, role).await {
                        Ok(()) => println!("✅ User '{}' is now {}", email, role.as_str()),
                        Err(err) => fail(format!("Failed to update role: {}", err)),
                    },
                    Ok(None) => fail(format!("User '{}' not found", email)),
                    Err(err) => fail(format!("Failed to find user: {}", err)),
                }
            }
        },
    }

    Ok(())
}
