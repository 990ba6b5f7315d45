use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{error, info, warn};
use std::process;

use nakama::auth::store::{load_account_store, save_account_store};
use nakama::auth::tokens::SignedTokenManager;
use nakama::auth::user_interface as auth_ui;
use nakama::email::{setup_email_credentials, test_email_configuration, SecureEmailManager};
use nakama::security::SecureSecret;
use nakama::social::user_interface as social_ui;
use nakama::social::ProfileUpdate;
use nakama::utils::logging::initialize_logging;
use nakama::utils::time::get_current_timestamp;
use nakama::{AccountId, AccountStore, AppConfig, OtpRecovery, Proof, SmtpMailer, TokenRecovery};

fn build_cli() -> Command {
    Command::new("nakama")
        .about("Accounts, profiles and follows for a small social network")
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .value_name("EMAIL")
                .help("Email of the account to act as"),
        )
        .subcommand(
            Command::new("register")
                .about("Create a new account")
                .arg(Arg::new("username").required(true))
                .arg(Arg::new("email").required(true)),
        )
        .subcommand(Command::new("login").about("Check your credentials"))
        .subcommand(Command::new("change-password").about("Change your password"))
        .subcommand(
            Command::new("profile")
                .about("Show a profile (your own by default)")
                .arg(Arg::new("username")),
        )
        .subcommand(
            Command::new("edit-profile")
                .about("Edit your username, bio or icon")
                .arg(Arg::new("username").long("username"))
                .arg(Arg::new("bio").long("bio"))
                .arg(Arg::new("icon").long("icon").help("Icon file name (jpg, jpeg or png)")),
        )
        .subcommand(
            Command::new("follow")
                .about("Follow a user")
                .arg(Arg::new("username").required(true)),
        )
        .subcommand(
            Command::new("unfollow")
                .about("Stop following a user")
                .arg(Arg::new("username").required(true)),
        )
        .subcommand(
            Command::new("followers")
                .about("List followers")
                .arg(Arg::new("username")),
        )
        .subcommand(
            Command::new("following")
                .about("List followed users")
                .arg(Arg::new("username")),
        )
        .subcommand(Command::new("users").about("List every account"))
        .subcommand(
            Command::new("settings")
                .about("Toggle an account setting")
                .arg(
                    Arg::new("setting")
                        .required(true)
                        .value_parser(["visibility", "follow-notify", "comment-notify", "dark-mode"]),
                ),
        )
        .subcommand(
            Command::new("reset")
                .about("Recover a forgotten password")
                .subcommand_required(true)
                .subcommand(
                    Command::new("request")
                        .about("Mail a reset code, or a reset link with --link")
                        .arg(Arg::new("email").required(true))
                        .arg(Arg::new("link").long("link").action(ArgAction::SetTrue)),
                )
                .subcommand(
                    Command::new("verify")
                        .about("Check a mailed code")
                        .arg(Arg::new("email").required(true))
                        .arg(Arg::new("code").required(true)),
                )
                .subcommand(
                    Command::new("password")
                        .about("Set a new password using a mailed code")
                        .arg(Arg::new("email").required(true))
                        .arg(Arg::new("code").required(true)),
                )
                .subcommand(
                    Command::new("token")
                        .about("Set a new password using a reset link token")
                        .arg(Arg::new("token").required(true)),
                ),
        )
        .subcommand(
            Command::new("email")
                .about("Configure outgoing mail")
                .subcommand_required(true)
                .subcommand(Command::new("setup").about("Store SMTP credentials"))
                .subcommand(
                    Command::new("test")
                        .about("Send a test message")
                        .arg(Arg::new("to").required(true)),
                ),
        )
        .subcommand(Command::new("help-all").about("Show a summary of every command"))
}

fn arg<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, String> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing argument: {}", name))
}

fn opt_arg<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a str> {
    matches.get_one::<String>(name).map(String::as_str)
}

/// Log in as `--user`, prompting for the password
fn session(store: &mut AccountStore, matches: &ArgMatches, now: u64) -> Result<AccountId, String> {
    let email = opt_arg(matches, "user").ok_or("This command requires --user <email>")?;
    auth_ui::login(store, email, now)
}

fn otp_flow(config: &AppConfig) -> OtpRecovery {
    OtpRecovery::new(config.otp_ttl_secs, &config.sender_name)
}

fn token_flow(config: &AppConfig) -> Result<TokenRecovery, String> {
    let secret = SecureSecret::signing_key()
        .and_then(|s| s.get_or_create())
        .map_err(|e| format!("Failed to load signing key: {}", e))?;
    let tokens = SignedTokenManager::new(&secret, config.token_max_age_secs);
    Ok(TokenRecovery::new(tokens, &config.reset_link_base, &config.sender_name))
}

fn smtp_mailer(config: &AppConfig) -> Result<SmtpMailer, String> {
    let credentials = SecureEmailManager::new()?.get_credentials()?;
    Ok(SmtpMailer::new(credentials, &config.sender_name))
}

fn handle_reset(
    matches: &ArgMatches,
    store: &mut AccountStore,
    config: &AppConfig,
    now: u64,
) -> Result<String, String> {
    match matches.subcommand() {
        Some(("request", sub)) => {
            let email = arg(sub, "email")?;
            let mailer = smtp_mailer(config)?;
            if sub.get_flag("link") {
                auth_ui::handle_reset_request(&token_flow(config)?, store, &mailer, email, now)
            } else {
                auth_ui::handle_reset_request(&otp_flow(config), store, &mailer, email, now)
            }
        }
        Some(("verify", sub)) => {
            let proof = Proof::code(arg(sub, "email")?, arg(sub, "code")?);
            auth_ui::handle_reset_verify(&otp_flow(config), store, &proof, now)
        }
        Some(("password", sub)) => {
            let proof = Proof::code(arg(sub, "email")?, arg(sub, "code")?);
            auth_ui::handle_reset_password(&otp_flow(config), store, &proof, now)
        }
        Some(("token", sub)) => {
            let proof = Proof::token(arg(sub, "token")?);
            auth_ui::handle_reset_password(&token_flow(config)?, store, &proof, now)
        }
        _ => Err("Unknown reset command".to_string()),
    }
}

/// Run one command against the store. Returns the message to print and
/// whether the store has to be written back.
fn dispatch(
    matches: &ArgMatches,
    store: &mut AccountStore,
    config: &AppConfig,
    now: u64,
) -> (Result<String, String>, bool) {
    match matches.subcommand() {
        Some(("register", sub)) => {
            let result = arg(sub, "username")
                .and_then(|u| arg(sub, "email").map(|e| (u, e)))
                .and_then(|(u, e)| auth_ui::handle_registration(store, u, e, now));
            (result, true)
        }
        Some(("login", _)) => {
            let previous = opt_arg(matches, "user")
                .and_then(|email| store.find_by_email(email))
                .and_then(|a| a.last_login);
            let result = session(store, matches, now)
                .and_then(|id| auth_ui::login_summary(store, id, previous));
            (result, true)
        }
        Some(("change-password", _)) => {
            let result = session(store, matches, now).and_then(|id| auth_ui::handle_change_password(store, id));
            (result, true)
        }
        Some(("profile", sub)) => {
            let result = session(store, matches, now).and_then(|id| {
                social_ui::handle_profile_command(store, id, opt_arg(sub, "username"), &config.icon_dir)
            });
            (result, true)
        }
        Some(("edit-profile", sub)) => {
            let update = ProfileUpdate {
                username: opt_arg(sub, "username").map(str::to_string),
                bio: opt_arg(sub, "bio").map(str::to_string),
                icon: opt_arg(sub, "icon").map(str::to_string),
            };
            let result = session(store, matches, now).and_then(|id| social_ui::handle_edit_profile(store, id, &update));
            (result, true)
        }
        Some((name @ ("follow" | "unfollow"), sub)) => {
            let result = session(store, matches, now).and_then(|id| {
                arg(sub, "username")
                    .and_then(|target| social_ui::handle_follow_command(store, id, target, name == "follow"))
            });
            (result, true)
        }
        Some(("followers", sub)) => {
            let result = session(store, matches, now)
                .and_then(|id| social_ui::handle_followers_command(store, id, opt_arg(sub, "username")));
            (result, true)
        }
        Some(("following", sub)) => {
            let result = session(store, matches, now)
                .and_then(|id| social_ui::handle_following_command(store, id, opt_arg(sub, "username")));
            (result, true)
        }
        Some(("users", _)) => (Ok(social_ui::handle_users_command(store)), false),
        Some(("settings", sub)) => {
            let result = session(store, matches, now).and_then(|id| {
                arg(sub, "setting").and_then(|setting| social_ui::handle_settings_command(store, id, setting))
            });
            (result, true)
        }
        Some(("reset", sub)) => {
            let mutating = !matches!(sub.subcommand_name(), Some("verify"));
            (handle_reset(sub, store, config, now), mutating)
        }
        Some(("help-all", _)) => {
            auth_ui::show_help_information();
            (Ok(String::new()), false)
        }
        _ => (Err("No command given. Run with --help for usage.".to_string()), false),
    }
}

fn handle_email(matches: &ArgMatches, config: &AppConfig) -> Result<(), String> {
    match matches.subcommand() {
        Some(("setup", _)) => setup_email_credentials(),
        Some(("test", sub)) => test_email_configuration(arg(sub, "to")?, &config.sender_name),
        _ => Err("Unknown email command".to_string()),
    }
}

fn run() -> Result<(), String> {
    let matches = build_cli().get_matches();

    let config = AppConfig::load()?;
    if let Err(e) = initialize_logging(&config.log_file, &config.log_level) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }
    info!("Starting {}", nakama::APP_NAME);

    // Mail configuration does not touch the account store
    if let Some(("email", sub)) = matches.subcommand() {
        return handle_email(sub, &config);
    }

    let master_key = SecureSecret::master_key()
        .and_then(|s| s.get_or_create())
        .map_err(|e| format!("Failed to load master key: {}", e))?;
    let mut store = load_account_store(&config.data_file, &master_key).map_err(|e| {
        error!("Failed to load account store: {}", e);
        format!("Failed to load account store: {}", e)
    })?;
    store.configure(config.password_policy(), config.password_hasher());

    let now = get_current_timestamp();
    let (result, mutating) = dispatch(&matches, &mut store, &config, now);

    // Failed operations leave the store as it was, except that an undelivered
    // reset message keeps its challenge, so saving is unconditional here.
    if mutating {
        if let Err(e) = save_account_store(&store, &config.data_file, &master_key) {
            error!("Failed to save account store: {}", e);
            return Err(format!("Failed to save account store: {}", e));
        }
    }

    match result {
        Ok(message) => {
            if !message.is_empty() {
                println!("{}", message);
            }
            Ok(())
        }
        Err(e) => {
            warn!("Command failed: {}", e);
            Err(e)
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
