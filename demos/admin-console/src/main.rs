use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use vigil::prelude::*;

// ---------------------------------------------------------------------------
// Fixture login API
// ---------------------------------------------------------------------------

const DEMO_PASSWORD: &str = "vigil";

/// Three staff accounts, one per role. Every login issues a fresh token.
struct FixtureApi {
    accounts: HashMap<String, User>,
}

impl FixtureApi {
    fn new() -> Self {
        let accounts = [
            (1, "Ada", Role::Admin),
            (2, "Eli", Role::Editor),
            (3, "Vic", Role::Viewer),
        ]
        .into_iter()
        .map(|(id, name, role)| {
            let email = format!("{}@example.org", name.to_lowercase());
            let user = User {
                id: UserId(id),
                name: name.into(),
                email: email.clone(),
                role,
            };
            (email, user)
        })
        .collect();
        Self { accounts }
    }
}

impl LoginClient for FixtureApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, LoginError> {
        let mut fields = FieldErrors::new();
        if credentials.email.trim().is_empty() {
            fields.insert("email".into(), vec!["is required".into()]);
        }
        if credentials.password.is_empty() {
            fields.insert("password".into(), vec!["is required".into()]);
        }
        if !fields.is_empty() {
            return Err(LoginError::Validation(fields));
        }

        match self.accounts.get(&credentials.email) {
            Some(user) if credentials.password == DEMO_PASSWORD => {
                let token = BearerToken::new(generate_token())
                    .ok_or_else(|| LoginError::Transport("empty token issued".into()))?;
                Ok(LoginResponse {
                    token,
                    user: user.clone(),
                })
            }
            _ => Err(LoginError::Rejected("Invalid email or password".into())),
        }
    }
}

/// 128 random bits as lowercase hex.
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Login { email: String, password: String },
    Logout,
    Go(String),
    Input(InputEvent),
    WhoAmI,
    Promote(Role),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".into());
    };
    let arg = words.next();

    let command = match (verb, arg) {
        ("login", Some(email)) => Command::Login {
            email: email.into(),
            password: words.next().unwrap_or_default().into(),
        },
        ("logout", None) => Command::Logout,
        ("go", Some(path)) => Command::Go(path.into()),
        ("click", None) => Command::Input(InputEvent::PointerDown),
        ("key", None) => Command::Input(InputEvent::KeyDown),
        ("scroll", None) => Command::Input(InputEvent::Scroll),
        ("touch", None) => Command::Input(InputEvent::TouchStart),
        ("move", None) => Command::Input(InputEvent::MouseMove),
        ("whoami", None) => Command::WhoAmI,
        ("promote", Some(role)) => {
            Command::Promote(role.parse().map_err(|e| format!("{e}"))?)
        }
        ("help", None) => Command::Help,
        ("quit" | "exit", None) => Command::Quit,
        _ => return Err(format!("unknown command: {line}")),
    };
    Ok(command)
}

const HELP: &str = "\
commands:
  login <email> <password>   sign in (try ada@example.org / vigil)
  logout                     sign out
  go <path>                  open a route, e.g. /users
  click | key | scroll | touch   interact (renews the session)
  move                       move the mouse (does not renew)
  whoami                     show the current session
  promote <role>             change your own role
  quit                       exit, keeping the stored session";

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

fn session_file() -> PathBuf {
    std::env::var_os("VIGIL_SESSION_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("vigil-admin-console.json"))
}

fn session_config() -> SessionConfig {
    std::env::var("VIGIL_IDLE_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(|secs| SessionConfig {
            idle_timeout: Duration::from_secs(secs),
        })
        .unwrap_or_default()
}

async fn run_command<L: LoginClient>(
    console: &mut Console<L>,
    command: Command,
) -> Result<(), VigilError> {
    match command {
        Command::Login { email, password } => {
            if let Some(notice) = console.take_login_notice() {
                println!("{}", notice.message());
            }
            match console.sign_in(&Credentials::new(email, password)).await {
                Ok(session) => {
                    println!("signed in as {} ({})", session.user.name, session.user.role);
                }
                Err(e) => match e.login_message() {
                    Some(message) => println!("login failed: {message}"),
                    None => return Err(e),
                },
            }
        }
        Command::Logout => {
            console.sign_out().await?;
            println!("signed out");
        }
        Command::Go(path) => match console.navigate(&path) {
            GateOutcome::Redirect(redirect) => {
                println!("-> {redirect}");
                if let Some(notice) = console.take_login_notice() {
                    println!("{}", notice.message());
                }
            }
            outcome => println!("{path}: {outcome}"),
        },
        Command::Input(event) => console.input().emit(event),
        Command::WhoAmI => match console.state() {
            AuthState::Authenticated(session) => {
                let user = serde_json::to_string_pretty(&session.user)
                    .unwrap_or_else(|_| session.user.name.clone());
                println!("{user}");
                println!("expires at {} (epoch ms)", session.expires_at_ms);
            }
            state => println!("{state:?}"),
        },
        Command::Promote(role) => match console.state().user() {
            Some(user) => {
                let updated = User {
                    role,
                    ..user.clone()
                };
                console.update_profile(updated).await?;
                println!("role is now {role}");
            }
            None => println!("not signed in"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    vigil::logging::init();

    let path = session_file();
    eprintln!("admin console (session file: {})", path.display());

    let mut console = Console::builder()
        .storage(FileStorage::new(path))
        .session_config(session_config())
        .build(FixtureApi::new())
        .await?;

    // Announce expiries as they happen, not just on the next command.
    let mut events = console.lifecycle().subscribe();
    let announcer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(LifecycleEvent::SignedOut {
                    reason: SignOutReason::IdleTimeout,
                }) => {
                    println!("\n(session expired due to inactivity)");
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    match console.state().user() {
        Some(user) => println!("welcome back, {} ({})", user.name, user.role),
        None => println!("not signed in; type `help`"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => run_command(&mut console, command).await?,
            Err(e) => println!("{e}"),
        }
    }

    console.shutdown().await;
    announcer.abort();
    Ok(())
}
