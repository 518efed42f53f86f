//! Command registry and dispatcher for skimmer.
//!
//! A flat verb-to-handler table. Handlers needing an identity are wrapped
//! with [`require_login`], which resolves the configured current user
//! before the inner handler runs; the two handler signatures stay distinct
//! at the type level.

pub mod handlers;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;
use crate::db::{Database, User, UserRepository};
use crate::{Result, SkimmerError};

/// A parsed command: verb plus ordered arguments. Transient, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command verb.
    pub verb: String,
    /// Positional arguments.
    pub args: Vec<String>,
}

impl Command {
    /// Create a command from a verb and arguments.
    pub fn new(verb: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            verb: verb.into(),
            args,
        }
    }

    /// Build a command from process arguments (program name excluded).
    pub fn parse<I>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut argv = argv.into_iter();
        let verb = argv
            .next()
            .ok_or_else(|| SkimmerError::Validation("no command given".to_string()))?;
        Ok(Self {
            verb,
            args: argv.collect(),
        })
    }
}

/// Shared state passed to every handler.
pub struct State {
    /// Open database handle.
    pub db: Database,
    /// Mutable configuration; login/register write it back.
    pub config: Config,
}

/// Future returned by a handler invocation.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Handler signature without a resolved identity.
pub type HandlerFn = for<'a> fn(&'a mut State, Command) -> HandlerFuture<'a>;

/// Handler signature taking the resolved current user.
pub type AuthedHandlerFn = for<'a> fn(&'a mut State, Command, User) -> HandlerFuture<'a>;

/// A registered handler.
#[derive(Clone, Copy)]
pub enum Handler {
    /// Runs as-is, no identity needed.
    Plain(HandlerFn),
    /// Wrapped by [`require_login`]; the current user is resolved first.
    Authenticated(AuthedHandlerFn),
}

impl Handler {
    /// Invoke the handler, resolving the current user first when required.
    pub async fn invoke(&self, state: &mut State, command: Command) -> Result<()> {
        match self {
            Handler::Plain(inner) => inner(state, command).await,
            Handler::Authenticated(inner) => {
                let user = resolve_current_user(state).await?;
                inner(state, command, user).await
            }
        }
    }
}

/// Wrap a handler that needs a resolved user into the outer handler shape.
///
/// On invocation the current user name is read from the config and
/// resolved through the user repository; when the name is unset or does
/// not resolve, the invocation fails unauthenticated and the inner handler
/// never runs.
pub fn require_login(inner: AuthedHandlerFn) -> Handler {
    Handler::Authenticated(inner)
}

/// Resolve the configured current user, shared by every authenticated
/// handler.
async fn resolve_current_user(state: &State) -> Result<User> {
    let name = match state.config.current_user() {
        Some(name) => name.to_string(),
        None => {
            return Err(SkimmerError::Unauthenticated(
                "no user is logged in".to_string(),
            ));
        }
    };

    UserRepository::new(state.db.pool())
        .get_by_name(&name)
        .await?
        .ok_or_else(|| SkimmerError::Unauthenticated(format!("user '{name}' does not exist")))
}

/// Command registry mapping verbs to handlers.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Handler>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a verb.
    ///
    /// Registering the same verb twice is a configuration error, not user
    /// input; callers are expected to treat it as fatal.
    pub fn register(&mut self, name: &str, handler: Handler) -> Result<()> {
        if self.handlers.contains_key(name) {
            return Err(SkimmerError::Config(format!(
                "command '{name}' is already registered"
            )));
        }
        self.handlers.insert(name.to_string(), handler);
        Ok(())
    }

    /// Registered verbs, sorted.
    pub fn verbs(&self) -> Vec<&str> {
        let mut verbs: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        verbs.sort_unstable();
        verbs
    }

    /// Look up the command's verb and invoke its handler.
    ///
    /// An unregistered verb fails without invoking anything. A handler
    /// failure is wrapped with the verb, the original error staying
    /// inspectable as the source.
    pub async fn run(&self, state: &mut State, command: Command) -> Result<()> {
        let handler = self
            .handlers
            .get(command.verb.as_str())
            .ok_or_else(|| SkimmerError::UnknownCommand(command.verb.clone()))?;

        let verb = command.verb.clone();
        handler
            .invoke(state, command)
            .await
            .map_err(|e| SkimmerError::CommandFailed {
                verb,
                source: Box::new(e),
            })
    }
}

/// Build the registry with every skimmer command.
pub fn default_registry() -> Result<CommandRegistry> {
    let mut registry = CommandRegistry::new();

    registry.register("register", Handler::Plain(handlers::register))?;
    registry.register("login", Handler::Plain(handlers::login))?;
    registry.register("reset", Handler::Plain(handlers::reset))?;
    registry.register("users", Handler::Plain(handlers::users))?;
    registry.register("agg", Handler::Plain(handlers::agg))?;
    registry.register("addfeed", require_login(handlers::addfeed))?;
    registry.register("feeds", Handler::Plain(handlers::feeds))?;
    registry.register("follow", require_login(handlers::follow))?;
    registry.register("following", require_login(handlers::following))?;

    Ok(registry)
}
