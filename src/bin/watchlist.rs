//! # watchlist — terminal client
//!
//! ```bash
//! watchlist --email jane@example.com --password 'secret12!' signup
//! watchlist --email jane@example.com --password 'secret12!' login     # prints a token
//! export STOCKSWIPE_TOKEN=<token>
//! watchlist stocks --sector technology
//! watchlist stocks --search tata
//! watchlist movers --losers
//! watchlist add 5
//! watchlist list --sort change-desc
//! watchlist price AAPL --exchange NASDAQ
//! watchlist remove 5
//! watchlist logout
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stockswipe::{
    client::{ApiClient, ClientAuth},
    models::{Stock, User},
    quotes::{ProxySource, QuoteSource},
    session::IdentitySession,
};

#[derive(Debug, Parser)]
#[command(name = "watchlist", version, about = "StockSwipe terminal client")]
struct Cli {
    /// Server origin.
    #[arg(long, env = "STOCKSWIPE_URL", default_value = "http://localhost:3000")]
    server: String,

    /// Id token from a previous `login`.
    #[arg(long, env = "STOCKSWIPE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "STOCKSWIPE_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "STOCKSWIPE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account.
    Signup {
        /// Defaults to --password.
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Sign in and print the id token.
    Login,
    /// Browse the catalog.
    Stocks {
        #[arg(long)]
        sector: Option<String>,
        /// Case-insensitive match on name or symbol.
        #[arg(long)]
        search: Option<String>,
    },
    /// Top gainers (or losers) by percent change.
    Movers {
        #[arg(long)]
        losers: bool,
    },
    /// One live quote through the server's price relay.
    Price {
        symbol: String,
        #[arg(long, default_value = "NSE")]
        exchange: String,
    },
    /// Show the watchlist with live prices.
    List {
        #[arg(long, default_value = "default")]
        sort: String,
    },
    Add { stock_id: i64 },
    Remove { stock_id: i64 },
    Logout,
}

fn credentials(cli: &Cli) -> anyhow::Result<(&str, &str)> {
    match (cli.email.as_deref(), cli.password.as_deref()) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => bail!("--email and --password (or STOCKSWIPE_EMAIL / STOCKSWIPE_PASSWORD) are required"),
    }
}

fn print_stocks(stocks: &[Stock]) {
    if stocks.is_empty() {
        println!("(empty)");
        return;
    }
    println!("{:>4}  {:<12} {:<8} {:>12} {:>9}  {}", "ID", "SYMBOL", "EXCH", "PRICE", "CHANGE", "NAME");
    for s in stocks {
        println!(
            "{:>4}  {:<12} {:<8} {:>12.2} {:>8.2}%  {}",
            s.id, s.symbol, s.exchange, s.price, s.change_percent, s.name
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let http = reqwest::Client::new();
    let api = ApiClient::new(http.clone(), cli.server.clone());

    // ── Commands that need no session ─────────────────────────────────────────
    match &cli.command {
        Command::Signup { confirm } => {
            let (email, password) = credentials(&cli)?;
            let login = api
                .signup(email, password, confirm.as_deref().unwrap_or(password))
                .await
                .context("Registration failed")?;
            println!("Account created successfully ({})", login.uid);
            println!("{}", login.id_token);
            return Ok(());
        }
        Command::Stocks { sector, search } => {
            print_stocks(&api.stocks(sector.as_deref(), search.as_deref()).await?);
            return Ok(());
        }
        Command::Movers { losers } => {
            let stocks = if *losers { api.losers().await? } else { api.gainers().await? };
            print_stocks(&stocks);
            return Ok(());
        }
        Command::Price { symbol, exchange } => {
            let relay = ProxySource::new(http, api.base_url());
            match relay.quote(symbol, exchange).await {
                Some(q) => println!("{symbol} {:.2} ({:+.2}, {:+.2}%)", q.price, q.change, q.change_percent),
                None => println!("{symbol}: no live quote available"),
            }
            return Ok(());
        }
        _ => {}
    }

    // ── Session ───────────────────────────────────────────────────────────────
    let auth = Arc::new(ClientAuth::new(api.clone()));
    let mut session = IdentitySession::init(auth.clone());

    match (&cli.token, &cli.command) {
        (Some(token), cmd) if !matches!(cmd, Command::Login) => auth.restore(Some(token.clone())).await,
        _ => match credentials(&cli) {
            Ok((email, password)) => {
                auth.sign_in(email, password).await.context("Login failed")?;
            }
            Err(_) => auth.restore(None).await,
        },
    }

    let Some(user) = session.ready().await.user else {
        bail!("Please login to continue");
    };

    let token = auth.token().await.context("Session has no token")?;
    run(&cli.command, &api, &token, &user, &session).await
}

async fn run(
    command: &Command,
    api: &ApiClient,
    token: &str,
    user: &User,
    session: &IdentitySession,
) -> anyhow::Result<()> {
    match command {
        Command::Login => {
            eprintln!("Signed in as {}", user.email.as_deref().unwrap_or(&user.uid));
            println!("{token}");
        }
        Command::List { sort } => print_stocks(&api.watchlist(token, sort).await?),
        Command::Add { stock_id } => {
            let resp = api.add(token, *stock_id).await.context("Error adding to watchlist")?;
            if resp.added {
                println!("Added stock {stock_id} to watchlist");
            } else {
                println!("{}", resp.message.as_deref().unwrap_or("Stock already in watchlist"));
            }
        }
        Command::Remove { stock_id } => {
            if api.remove(token, *stock_id).await.context("Error removing from watchlist")? {
                println!("Stock removed");
            } else {
                println!("Stock {stock_id} was not in the watchlist");
            }
        }
        Command::Logout => {
            session
                .logout(|| async {
                    println!("Logged out successfully");
                    Ok(())
                })
                .await?;
        }
        Command::Signup { .. } | Command::Stocks { .. } | Command::Movers { .. } | Command::Price { .. } => {}
    }
    Ok(())
}
