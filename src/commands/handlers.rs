//! Command handlers for skimmer.
//!
//! Each handler validates its arguments, performs its operation through
//! the repositories and services, and prints its result to stdout.

use tracing::{info, warn};

use super::{Command, HandlerFuture, State};
use crate::db::{NewUser, User, UserRepository};
use crate::feed::{FeedRepository, SubscriptionService};
use crate::rss::{validate_url, FeedFetcher, ParsedFeed};
use crate::{Result, SkimmerError};

/// Check the exact argument count, returning the arguments.
fn expect_args(command: &Command, count: usize, usage: &str) -> Result<Vec<String>> {
    if command.args.len() != count {
        return Err(SkimmerError::Validation(format!("usage: {usage}")));
    }
    Ok(command.args.clone())
}

/// `register <name>`: create a user and log in as them.
pub fn register(state: &mut State, command: Command) -> HandlerFuture<'_> {
    Box::pin(async move {
        let args = expect_args(&command, 1, "register <name>")?;
        let name = args[0].as_str();

        let user = UserRepository::new(state.db.pool())
            .create(&NewUser::new(name))
            .await?;
        info!("registered user {} (id {})", user.name, user.id);

        state.config.set_current_user(&user.name)?;
        println!("Registered and logged in as {}", user.name);
        Ok(())
    })
}

/// `login <name>`: switch the current user to an existing one.
pub fn login(state: &mut State, command: Command) -> HandlerFuture<'_> {
    Box::pin(async move {
        let args = expect_args(&command, 1, "login <name>")?;
        let name = &args[0];

        let user = UserRepository::new(state.db.pool())
            .get_by_name(name)
            .await?
            .ok_or_else(|| SkimmerError::NotFound(format!("user '{name}'")))?;

        state.config.set_current_user(&user.name)?;
        println!("Logged in as {}", user.name);
        Ok(())
    })
}

/// `reset`: administrative bulk delete of all users (and, through
/// cascading foreign keys, their feeds, follows and items).
pub fn reset(state: &mut State, command: Command) -> HandlerFuture<'_> {
    Box::pin(async move {
        expect_args(&command, 0, "reset")?;

        let deleted = UserRepository::new(state.db.pool()).delete_all().await?;
        println!("Removed {deleted} user(s)");
        Ok(())
    })
}

/// `users`: list all users, marking the current one.
pub fn users(state: &mut State, command: Command) -> HandlerFuture<'_> {
    Box::pin(async move {
        expect_args(&command, 0, "users")?;

        let users = UserRepository::new(state.db.pool()).list_all().await?;
        let current = state.config.current_user();

        for user in &users {
            if Some(user.name.as_str()) == current {
                println!("* {} (current)", user.name);
            } else {
                println!("* {}", user.name);
            }
        }
        Ok(())
    })
}

/// `agg [url]`: fetch feeds once and store new items.
///
/// With a URL argument only that feed is fetched and printed. Without one,
/// every stored feed is fetched in registration order; a failing feed is
/// logged and skipped so the rest still run.
pub fn agg(state: &mut State, command: Command) -> HandlerFuture<'_> {
    Box::pin(async move {
        if command.args.len() > 1 {
            return Err(SkimmerError::Validation("usage: agg [url]".to_string()));
        }

        let fetcher = FeedFetcher::new(&state.config.fetch)?;

        if let Some(url) = command.args.first() {
            let parsed = fetcher.fetch(url).await?;
            print_feed(url, &parsed);
            return Ok(());
        }

        let feeds = FeedRepository::new(state.db.pool()).list_all().await?;
        if feeds.is_empty() {
            println!("No feeds registered");
            return Ok(());
        }

        let service = SubscriptionService::new(&state.db);
        let mut failed = 0usize;

        for feed in feeds {
            match fetcher.fetch(&feed.url).await {
                Ok(parsed) => {
                    let stored = service.store_items(feed.id, &parsed).await?;
                    print_feed(&feed.url, &parsed);
                    println!("{stored} new item(s)");
                }
                Err(e) => {
                    warn!("fetch failed for {}: {}", feed.url, e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            println!("{failed} feed(s) failed to fetch");
        }
        Ok(())
    })
}

/// `addfeed <name> <url>`: register a feed and follow it.
pub fn addfeed(state: &mut State, command: Command, user: User) -> HandlerFuture<'_> {
    Box::pin(async move {
        let args = expect_args(&command, 2, "addfeed <name> <url>")?;
        let (name, url) = (&args[0], &args[1]);

        validate_url(url)?;

        let feed = SubscriptionService::new(&state.db)
            .add_feed(&user, name, url)
            .await?;
        println!("Added feed '{}' ({}) and followed it", feed.name, feed.url);
        Ok(())
    })
}

/// `feeds`: list every registered feed with its owner.
pub fn feeds(state: &mut State, command: Command) -> HandlerFuture<'_> {
    Box::pin(async move {
        expect_args(&command, 0, "feeds")?;

        let feeds = SubscriptionService::new(&state.db).list_feeds().await?;
        if feeds.is_empty() {
            println!("No feeds registered");
            return Ok(());
        }

        for entry in &feeds {
            println!(
                "* {} <{}> added by {}",
                entry.feed.name, entry.feed.url, entry.owner_name
            );
        }
        Ok(())
    })
}

/// `follow <url>`: follow an already-registered feed.
pub fn follow(state: &mut State, command: Command, user: User) -> HandlerFuture<'_> {
    Box::pin(async move {
        let args = expect_args(&command, 1, "follow <url>")?;
        let url = &args[0];

        let followed = SubscriptionService::new(&state.db).follow(&user, url).await?;
        println!("Now following '{}'", followed.feed_name);
        Ok(())
    })
}

/// `following`: list the names of the feeds the current user follows.
pub fn following(state: &mut State, command: Command, user: User) -> HandlerFuture<'_> {
    Box::pin(async move {
        expect_args(&command, 0, "following")?;

        let names = SubscriptionService::new(&state.db).list_follows(&user).await?;
        if names.is_empty() {
            println!("Not following any feeds");
            return Ok(());
        }

        for name in &names {
            println!("* {name}");
        }
        Ok(())
    })
}

/// Print a fetched feed the way the aggregator reports it.
fn print_feed(url: &str, parsed: &ParsedFeed) {
    println!("=== {url} ===");
    println!("{}", parsed.title);
    if !parsed.description.is_empty() {
        println!("{}", parsed.description);
    }
    for item in &parsed.items {
        println!("- {}", item.title);
        if let Some(link) = &item.link {
            println!("  {link}");
        }
        if !item.description.is_empty() {
            println!("  {}", item.description);
        }
    }
}
