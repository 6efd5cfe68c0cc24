//! Live countdown view.

use anyhow::Result;
use birthday_core::{
    KeyValueStorage, Person, ReminderSession, SortOrder, TickerSet, TICK_PERIOD,
};
use log::info;
use std::future::Future;

/// Prints every visible countdown once per tick until `ticks` refreshes
/// were shown or Ctrl-C arrives.
pub async fn run<S: KeyValueStorage>(
    session: &ReminderSession<S>,
    order: SortOrder,
    ticks: Option<u32>,
) -> Result<()> {
    run_until(session, order, ticks, tokio::signal::ctrl_c()).await?;
    Ok(())
}

/// Same as [`run`], stopping when `stop` completes. Returns the number of
/// refreshes shown.
///
/// `stop` is created once and polled across iterations, so a stop request
/// that lands during a render is still honoured.
async fn run_until<S, F>(
    session: &ReminderSession<S>,
    order: SortOrder,
    ticks: Option<u32>,
    stop: F,
) -> Result<u32>
where
    S: KeyValueStorage,
    F: Future,
{
    let visible: Vec<Person> = session
        .list_view(order)
        .rows
        .into_iter()
        .map(|row| row.person)
        .collect();
    if visible.is_empty() {
        println!("no birthdays in the list");
        return Ok(0);
    }

    let mut tickers = TickerSet::new(session.clock())?;
    tickers.sync_visible(&visible);
    info!(
        "event=watch_start module=cli status=ok tickers={}",
        tickers.len()
    );

    tokio::pin!(stop);
    let mut interval = tokio::time::interval(TICK_PERIOD);
    let mut shown = 0_u32;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                render(&visible, &tickers);
                shown += 1;
                if ticks.is_some_and(|limit| shown >= limit) {
                    break;
                }
            }
            _ = &mut stop => break,
        }
    }

    tickers.clear();
    info!("event=watch_stop module=cli status=ok refreshes={shown}");
    Ok(shown)
}

fn render(visible: &[Person], tickers: &TickerSet) {
    println!("--");
    for person in visible {
        match tickers.latest(&person.id) {
            Some(countdown) => println!("{}: {}", person.name, countdown),
            None => println!("{}: no birth date", person.name),
        }
    }
}
