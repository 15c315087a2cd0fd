use snafu::ResultExt;

use super::{Context, render, thread};
use crate::error::{ApiSnafu, CliResult};

/// Archive totals followed by a random sample, both requested at once.
pub async fn overview(context: &Context) -> CliResult<Vec<String>> {
    let (stats, sample) = futures::try_join!(
        context.client.global_stats(),
        context.client.random_messages()
    )
    .context(ApiSnafu {
        stage: "fetch-overview",
    })?;

    context.store.set_stats(stats.clone());
    let mut lines = render::stats_lines(&stats);
    if !sample.items.is_empty() {
        lines.push(String::new());
        lines.push("random sample:".to_string());
        lines.extend(thread::page_lines(context, sample));
    }
    Ok(lines)
}
