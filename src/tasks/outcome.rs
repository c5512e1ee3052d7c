use anyhow::{anyhow, Context};

use crate::lti::outcome::post_score;
use crate::store::Store;

/// Loads the graded launch and posts `score` back to the consumer.
pub async fn send_outcome(
    store: &dyn Store,
    client: &reqwest::Client,
    score: f64,
    assignment_id: i64,
) -> anyhow::Result<()> {
    let launch = store
        .get_graded_launch(assignment_id)
        .await
        .map_err(|e| anyhow!("{}", e))?
        .ok_or_else(|| anyhow!("Graded launch {} not found", assignment_id))?;

    post_score(client, &launch, score)
        .await
        .with_context(|| format!("posting score for graded launch {}", assignment_id))?;
    tracing::info!(assignment_id, score, "LTI outcome posted");
    Ok(())
}
