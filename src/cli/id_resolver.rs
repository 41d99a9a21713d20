//! Short ID prefix resolution for CLI commands.
//!
//! Allows users to specify any unique prefix of an agent UUID instead of the
//! full id, similar to git short hashes. Soft-deleted agents still resolve so
//! that `show` and `delete` can report on them.

use anyhow::{bail, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

const AGENT_QUERY: &str = "SELECT public_id FROM agents WHERE public_id LIKE ? ORDER BY public_id";

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        bail!("ID prefix must not be empty");
    }
    if !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        bail!("Invalid ID prefix '{prefix}': must contain only hex characters and dashes");
    }
    Ok(())
}

/// Resolve an agent ID prefix to a full UUID.
pub async fn resolve_agent_id(pool: &SqlitePool, prefix: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(prefix) {
        return Ok(uuid);
    }

    validate_prefix(prefix)?;

    let pattern = format!("{}%", prefix.to_lowercase());
    let rows: Vec<(String,)> = sqlx::query_as(AGENT_QUERY)
        .bind(&pattern)
        .fetch_all(pool)
        .await?;

    match rows.as_slice() {
        [] => bail!("No agent found matching '{prefix}'"),
        [(id,)] => Ok(Uuid::parse_str(id)?),
        many => {
            let mut msg = format!("Ambiguous prefix '{prefix}': matches {} agents:", many.len());
            for (id,) in many {
                msg.push_str("\n  ");
                msg.push_str(id);
            }
            bail!("{msg}")
        }
    }
}
