//! Snapshot fetching and selection, shared by agents and the prober.

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::result_code::ResultCode;
use crate::core::selector::{SelectOptions, select_target};
use crate::core::types::{Planet, Target};
use crate::io::api::{ApiError, GameApi};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("planet list rejected: {0}")]
    Rejected(ResultCode),
    #[error("planet list request failed: {0}")]
    Api(#[from] ApiError),
}

/// Fetch every active planet together with its zones.
///
/// The planet list must load; a planet whose detail request fails is left out
/// of the snapshot rather than failing it.
pub async fn fetch_snapshot<A: GameApi + ?Sized>(api: &A) -> Result<Vec<Planet>, SnapshotError> {
    let reply = api.planets().await?;
    let code = reply.code;
    let listed = reply.into_ok().ok_or(SnapshotError::Rejected(code))?;

    let mut planets = Vec::with_capacity(listed.len());
    for summary in listed {
        match api.planet(summary.id).await {
            Ok(reply) => {
                let code = reply.code;
                match reply.into_ok() {
                    Some(planet) => planets.push(planet),
                    None => warn!(planet_id = summary.id, %code, "skipping planet"),
                }
            }
            Err(err) => warn!(planet_id = summary.id, error = %err, "skipping planet"),
        }
    }
    debug!(planets = planets.len(), "snapshot fetched");
    Ok(planets)
}

/// Fetch a fresh snapshot and pick the best target in it.
pub async fn discover<A: GameApi + ?Sized>(
    api: &A,
    options: SelectOptions,
) -> Result<Option<Target>, SnapshotError> {
    let planets = fetch_snapshot(api).await?;
    Ok(select_target(&planets, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedGameApi, normal_zone, planet};

    #[tokio::test]
    async fn discover_uses_planet_details() {
        let api = ScriptedGameApi::new(vec![
            planet(1, "A", vec![normal_zone(1, 0, 1, 5.0)]),
            planet(2, "B", vec![normal_zone(2, 3, 3, 2.0)]),
        ]);

        let target = discover(&api, SelectOptions::default())
            .await
            .expect("discover")
            .expect("target");
        assert_eq!(target.planet_id, 2);
        assert_eq!(target.zone.position, 3);
    }

    #[tokio::test]
    async fn failed_planet_detail_is_skipped() {
        let api = ScriptedGameApi::new(vec![
            planet(1, "A", vec![normal_zone(1, 0, 3, 5.0)]),
            planet(2, "B", vec![normal_zone(2, 3, 2, 2.0)]),
        ]);
        api.fail_planet(1);

        let snapshot = fetch_snapshot(&api).await.expect("snapshot");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, 2);
    }

    #[tokio::test]
    async fn rejected_planet_list_is_an_error() {
        let api = ScriptedGameApi::new(Vec::new());
        api.push_planets_code(ResultCode::Transient(2));

        let err = fetch_snapshot(&api).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Rejected(ResultCode::Transient(2))));
    }
}
