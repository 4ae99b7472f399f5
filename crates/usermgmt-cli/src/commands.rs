//! Command dispatch for the CLI.
//!
//! Each command navigates to the page its web counterpart lives on before
//! doing anything, and pumps session events after talking to the server.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use futures::future::join_all;
use tracing::{debug, warn};

use usermgmt_core::auth::{LOGIN_FAILED_MESSAGE, REGISTER_FAILED_MESSAGE};
use usermgmt_core::config::Config;
use usermgmt_core::models::{LoginRequest, RegisterRequest, UserUpdate};
use usermgmt_core::router::{Navigation, Redirect};
use usermgmt_core::AppContext;

use crate::display::{user_details, user_table};

/// Login username, checked before the config's last username
const ENV_USERNAME: &str = "USERMGMT_USERNAME";

/// Login password, checked before prompting
const ENV_PASSWORD: &str = "USERMGMT_PASSWORD";

const HELP: &str = "\
usage: usermgmt [--server URL] [--storage file|keychain|memory] [--ephemeral] <command>

commands:
  login [username]                 log in (password from USERMGMT_PASSWORD or prompt)
  register                         create an account
  logout                           forget the stored session
  whoami                           show your own profile
  status                           show the local session
  users list                       list all users
  users show <id>...               show one or more users
  users update <id> key=value...   update email, fullName, phone, role or status
  users delete <id>                delete a user
  users toggle <id>                enable or disable a user
  open <path>                      check where a page would take you
  help                             show this message";

pub async fn run(ctx: &mut AppContext, config: &mut Config, args: &[String]) -> Result<()> {
    let command = args.first().map(String::as_str).unwrap_or("help");
    let rest = args.get(1..).unwrap_or(&[]);
    debug!(command, "Running command");

    match command {
        "login" => login(ctx, config, rest.first().cloned()).await,
        "register" => register(ctx).await,
        "logout" => {
            ctx.session_mut().logout();
            println!("Logged out.");
            Ok(())
        }
        "whoami" => whoami(ctx).await,
        "status" => {
            status(ctx, config);
            Ok(())
        }
        "users" => users(ctx, rest).await,
        "open" => {
            let path = rest.first().map(String::as_str).unwrap_or("/");
            open(ctx, path);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            println!("{}", HELP);
            Ok(())
        }
        other => bail!("Unknown command: {} (try `usermgmt help`)", other),
    }
}

// ============================================================================
// Navigation helpers
// ============================================================================

/// Open `path`, failing with a user-facing reason if the guard redirects.
fn enter(ctx: &mut AppContext, path: &str) -> Result<Navigation> {
    let nav = ctx.open(path);
    match nav.redirected {
        Some(Redirect::Login) => bail!("Please log in first (usermgmt login)"),
        Some(Redirect::Home) => bail!("Administrator privileges required"),
        None => Ok(nav),
    }
}

/// Surface a server-side invalidation as an expired session instead of the raw error.
fn settle<T>(ctx: &mut AppContext, result: Result<T>) -> Result<T> {
    if ctx.pump_events() {
        if let Err(ref e) = result {
            debug!(error = %e, "Request rejected with invalidated session");
        }
        bail!("Session expired, please log in again");
    }
    result
}

/// The message the session recorded for its last failed action.
fn session_error(ctx: &AppContext, fallback: &str) -> String {
    ctx.session()
        .state()
        .error
        .clone()
        .unwrap_or_else(|| fallback.to_string())
}

fn parse_id(value: Option<&String>) -> Result<i64> {
    let value = value.ok_or_else(|| anyhow::anyhow!("Missing user id"))?;
    value
        .parse()
        .with_context(|| format!("Invalid user id: {}", value))
}

// ============================================================================
// Prompts
// ============================================================================

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_optional(label: &str) -> Result<Option<String>> {
    let value = prompt(label)?;
    Ok(if value.is_empty() { None } else { Some(value) })
}

fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}

// ============================================================================
// Commands
// ============================================================================

async fn login(ctx: &mut AppContext, config: &mut Config, username: Option<String>) -> Result<()> {
    enter(ctx, "/login")?;

    let username = match username
        .or_else(|| std::env::var(ENV_USERNAME).ok())
        .or_else(|| config.last_username.clone())
    {
        Some(u) if !u.is_empty() => u,
        _ => prompt("Username")?,
    };
    let password = match std::env::var(ENV_PASSWORD) {
        Ok(p) if !p.is_empty() => p,
        _ => prompt_password()?,
    };

    if username.is_empty() || password.is_empty() {
        bail!("Username and password required");
    }

    let result = ctx
        .session_mut()
        .login(&LoginRequest::new(username.clone(), password))
        .await;
    // A rejected login also reports 401; there is no session to expire here
    ctx.pump_events();

    if result.is_err() {
        bail!(session_error(ctx, LOGIN_FAILED_MESSAGE));
    }

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    let user = ctx.session().user().map(|u| (u.display_name(), u.role.clone()));
    if let Some((name, role)) = user {
        println!("Logged in as {} ({})", name, role);
    }
    Ok(())
}

async fn register(ctx: &mut AppContext) -> Result<()> {
    enter(ctx, "/register")?;

    let username = prompt("Username")?;
    let email = prompt("Email")?;
    let password = prompt_password()?;
    let full_name = prompt_optional("Full name (optional)")?;
    let phone = prompt_optional("Phone (optional)")?;

    if username.is_empty() || email.is_empty() || password.is_empty() {
        bail!("Username, email and password required");
    }

    let request = RegisterRequest {
        username,
        email,
        password,
        full_name,
        phone,
    };

    match ctx.session_mut().register(&request).await {
        Ok(response) => {
            println!("{}", response.message);
            println!("You can now log in with `usermgmt login {}`.", request.username);
            Ok(())
        }
        Err(_) => bail!(session_error(ctx, REGISTER_FAILED_MESSAGE)),
    }
}

async fn whoami(ctx: &mut AppContext) -> Result<()> {
    enter(ctx, "/profile")?;
    let result = ctx.session_mut().fetch_current_user().await;
    let user = settle(ctx, result)?;
    println!("{}", user_details(&user));
    Ok(())
}

fn status(ctx: &AppContext, config: &Config) {
    let session = ctx.session();
    println!("Server:   {}", ctx.api().base_url());
    println!("Storage:  {:?}", config.storage);
    match session.user() {
        Some(user) if session.is_logged_in() => {
            println!("Session:  logged in as {} ({})", user.display_name(), user.role);
        }
        _ if session.is_logged_in() => println!("Session:  logged in"),
        _ => println!("Session:  logged out"),
    }
}

fn open(ctx: &mut AppContext, path: &str) {
    let nav = ctx.open(path);
    let page = nav.view().title();
    match nav.redirected {
        Some(Redirect::Login) => println!("{} -> {} (login required)", path, nav.route.path),
        Some(Redirect::Home) => println!("{} -> {} (administrators only)", path, nav.route.path),
        None => println!("{} -> {} [{}]", path, nav.route.path, page),
    }
}

async fn users(ctx: &mut AppContext, args: &[String]) -> Result<()> {
    let sub = args.first().map(String::as_str).unwrap_or("list");
    let rest = args.get(1..).unwrap_or(&[]);

    match sub {
        "list" => {
            enter(ctx, "/users")?;
            let result = ctx.api().list_users().await;
            let users = settle(ctx, result)?;
            println!("{}", user_table(&users));
            Ok(())
        }
        "show" => {
            if rest.is_empty() {
                bail!("Missing user id");
            }
            let ids = rest
                .iter()
                .map(|id| parse_id(Some(id)))
                .collect::<Result<Vec<_>>>()?;
            for id in &ids {
                enter(ctx, &format!("/users/{}", id))?;
            }

            let api = ctx.api().clone();
            let results = join_all(ids.iter().map(|id| api.get_user(*id))).await;
            let mut failed = false;
            for (id, result) in ids.iter().zip(results) {
                match result {
                    Ok(user) => println!("{}\n", user_details(&user)),
                    Err(e) => {
                        failed = true;
                        eprintln!("User {}: {}", id, e);
                    }
                }
            }
            settle(ctx, Ok(()))?;
            if failed {
                bail!("Some users could not be fetched");
            }
            Ok(())
        }
        "update" => {
            let id = parse_id(rest.first())?;
            let mut update = UserUpdate::default();
            for assignment in rest.iter().skip(1) {
                let (key, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| anyhow::anyhow!("Expected key=value, got {}", assignment))?;
                if !update.set_field(key, value) {
                    bail!("Unknown field: {}", key);
                }
            }
            if update.is_empty() {
                bail!("Nothing to update");
            }

            enter(ctx, "/admin/users")?;
            let result = ctx.api().update_user(id, &update).await;
            println!("{}", settle(ctx, result)?.message);
            Ok(())
        }
        "delete" => {
            let id = parse_id(rest.first())?;
            enter(ctx, "/admin/users")?;
            let result = ctx.api().delete_user(id).await;
            println!("{}", settle(ctx, result)?.message);
            Ok(())
        }
        "toggle" => {
            let id = parse_id(rest.first())?;
            enter(ctx, "/admin/users")?;
            let result = ctx.api().toggle_user_status(id).await;
            println!("{}", settle(ctx, result)?.message);
            Ok(())
        }
        other => bail!("Unknown users command: {}", other),
    }
}
