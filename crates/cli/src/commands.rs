use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use finguide_client::{HttpParser, RemoteParser};
use finguide_core::{MessageFilter, SimulationInput, SimulationResult, KEY_INITIAL_IMPORT_DONE};
use finguide_sms::{
    ConsentEvent, ConsentFlow, ConsentState, FileMessageSource, HistoricalImporter, ImportOptions,
    ListenerFailure, LiveListener, MessageSource,
};
use finguide_storage::{clear_sms_state, load_consent, KeyValueStore, SqliteStore};
use rust_decimal::Decimal;
use tokio::sync::broadcast::error::RecvError;

use crate::config::AppConfig;

/// Live messages buffered per subscriber before the slowest one starts lagging.
const LIVE_FEED_CAPACITY: usize = 64;

pub struct AppContext {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn MessageSource>,
    parser: Arc<dyn RemoteParser>,
    listener: Arc<LiveListener>,
    filter: MessageFilter,
    options: ImportOptions,
}

impl AppContext {
    pub async fn build(config: &AppConfig, data_dir: &Path) -> Result<Self> {
        let db_path = data_dir.join("finguide.db");
        let store = SqliteStore::open(&db_path)
            .await
            .with_context(|| format!("Failed to open {}", db_path.display()))?;

        let source = FileMessageSource::new(
            config.inbox_path(data_dir),
            config.intake_dir(data_dir),
        );
        let parser: Arc<dyn RemoteParser> =
            Arc::new(HttpParser::new(&config.api).context("Invalid [api] settings")?);
        let filter = MessageFilter::new(config.filter.clone());
        let listener = Arc::new(
            LiveListener::new(parser.clone(), filter.clone(), LIVE_FEED_CAPACITY)
                .with_failure_reporter(Arc::new(|failure: &ListenerFailure| {
                    eprintln!("! dropped live message: {}", failure.error);
                })),
        );

        Ok(Self {
            store: Arc::new(store),
            source: Arc::new(source),
            parser,
            listener,
            filter,
            options: config.import_options(),
        })
    }

    fn flow(&self) -> ConsentFlow {
        ConsentFlow::new(
            self.source.clone(),
            self.parser.clone(),
            self.store.clone(),
            self.listener.clone(),
            self.options,
            self.filter.clone(),
        )
    }
}

pub async fn status(ctx: &AppContext) -> Result<()> {
    let record = load_consent(ctx.store.as_ref()).await?;
    let imported = ctx
        .store
        .get_bool(KEY_INITIAL_IMPORT_DONE)
        .await?
        .unwrap_or(false);

    println!("consent given:        {}", record.given);
    println!("consent flow done:    {}", record.flow_completed);
    println!("initial import done:  {imported}");
    if record.needs_prompt() {
        println!("next launch will ask for SMS access");
    }
    Ok(())
}

pub async fn accept(ctx: &AppContext, listen: bool) -> Result<()> {
    let flow = ctx.flow();
    let resuming = !flow.needs_consent().await?;
    if resuming && !load_consent(ctx.store.as_ref()).await?.given {
        anyhow::bail!("SMS access was declined earlier; run `finguide reset` to be asked again");
    }

    let end = flow.handle(ConsentEvent::Accepted).await?;
    match &end {
        ConsentState::Complete { .. } if resuming => {
            println!("SMS access already granted, skipping the initial import")
        }
        _ => report(&end),
    }

    if !listen || !matches!(end, ConsentState::Complete { .. }) {
        ctx.source.stop();
        ctx.listener.dispose();
        return Ok(());
    }

    let Some(mut feed) = ctx.listener.subscribe() else {
        return Ok(());
    };
    println!("Listening for new messages, Ctrl-C to stop");

    loop {
        tokio::select! {
            received = feed.recv() => match received {
                Ok(message) => println!("+ {} | {}", message.address(), message.body()),
                Err(RecvError::Lagged(n)) => tracing::warn!("Live feed skipped {n} messages"),
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to wait for Ctrl-C")?;
                break;
            }
        }
    }

    ctx.source.stop();
    ctx.listener.dispose();
    Ok(())
}

pub async fn decline(ctx: &AppContext) -> Result<()> {
    let end = ctx.flow().handle(ConsentEvent::Declined).await?;
    report(&end);
    Ok(())
}

pub async fn import(ctx: &AppContext) -> Result<()> {
    let record = load_consent(ctx.store.as_ref()).await?;
    if !record.given {
        anyhow::bail!("SMS access has not been granted; run `finguide accept` first");
    }

    let importer = HistoricalImporter::new(
        ctx.source.clone(),
        ctx.parser.clone(),
        ctx.store.clone(),
        ctx.filter.clone(),
        ctx.options,
    );
    let result = importer.run().await;
    println!(
        "read {}, matched {}, parsed {} in {} batch(es)",
        result.read, result.matched, result.parsed, result.batches
    );
    if let Some(error) = result.aborted {
        anyhow::bail!("Import aborted: {error}");
    }
    Ok(())
}

pub async fn reset(ctx: &AppContext) -> Result<()> {
    clear_sms_state(ctx.store.as_ref()).await?;
    println!("SMS consent and import state cleared");
    Ok(())
}

pub fn check(config: &AppConfig, sender: &str, body: &str) {
    let filter = MessageFilter::new(config.filter.clone());
    let by_sender = filter.sender_matches(Some(sender));
    let by_body = filter.body_matches(Some(body));
    println!("sender match: {by_sender}");
    println!("body match:   {by_body}");
    println!("financial:    {}", by_sender || by_body);
}

pub fn simulate(principal: Decimal, monthly: Decimal, rate: Decimal, months: u32) -> Result<()> {
    let result = SimulationResult::calculate(&SimulationInput {
        principal,
        monthly_contribution: monthly,
        annual_rate_percent: rate,
        months,
    })?;

    for point in result.schedule.iter().filter(|p| p.month % 12 == 0 || p.month == months) {
        println!("month {:>4}  balance {}", point.month, point.balance);
    }
    println!("contributed {}", result.total_contributed);
    println!("interest    {}", result.total_interest);
    println!("final       {}", result.final_balance);
    Ok(())
}

fn report(state: &ConsentState) {
    match state {
        ConsentState::Complete { imported } => {
            println!("SMS access granted, {imported} transaction(s) imported")
        }
        ConsentState::Skipped => println!("SMS access declined"),
        ConsentState::PermissionDenied => {
            println!("SMS access not available; FinGuide will work without SMS data")
        }
        ConsentState::Error { message } => {
            println!("SMS import failed ({message}); FinGuide will work without SMS data")
        }
        other => println!("{other:?}"),
    }
}
