use std::{collections::BTreeMap, future::Future, sync::Arc, time::Duration};

use arc_swap::ArcSwap;
use slping::{Report, ServerAddress, ServerStatus};
use tokio::{select, task::JoinSet};

/// Latest report per watched server, keyed by `host:port`.
pub type Board = BTreeMap<String, Report>;

/// The watched servers, each owning its own status handle.
///
/// A refresh round hands every handle to its own task, so no handle is ever
/// refreshed twice at once. Results are published as a whole new [`Board`].
pub struct Pool {
    statuses: Vec<ServerStatus>,
    board: Arc<ArcSwap<Board>>,
    timeout: Duration,
}

impl Pool {
    pub fn new(hosts: Vec<ServerAddress>, timeout: Duration) -> Self {
        let statuses: Vec<ServerStatus> = hosts
            .into_iter()
            .map(|address| ServerStatus::with_timeout(address, timeout))
            .collect();
        let board = statuses
            .iter()
            .map(|status| (status.address().to_string(), status.report().clone()))
            .collect();
        Self {
            statuses,
            board: Arc::new(ArcSwap::from_pointee(board)),
            timeout,
        }
    }

    pub fn board(&self) -> Arc<ArcSwap<Board>> {
        Arc::clone(&self.board)
    }

    pub async fn refresh(&mut self) {
        self.run_round(|mut status| async move {
            status.refresh_async().await;
            status
        })
        .await;
    }

    /// Runs `probe` on every handle in its own task and publishes the results.
    ///
    /// A server whose task fails is kept with a fresh handle and reported
    /// unavailable.
    async fn run_round<F, Fut>(&mut self, probe: F)
    where
        F: Fn(ServerStatus) -> Fut,
        Fut: Future<Output = ServerStatus> + Send + 'static,
    {
        let mut round = JoinSet::new();
        let mut pending = BTreeMap::new();
        for status in self.statuses.drain(..) {
            pending.insert(status.address().to_string(), status.address().clone());
            round.spawn(probe(status));
        }

        let mut board = Board::new();
        while let Some(joined) = round.join_next().await {
            match joined {
                Ok(status) => {
                    let key = status.address().to_string();
                    pending.remove(&key);
                    board.insert(key, status.report().clone());
                    self.statuses.push(status);
                }
                Err(error) => error!(?error, "refresh task failed"),
            }
        }
        for (key, address) in pending {
            warn!(%address, "no report this round, marking unavailable");
            board.insert(key, Report::default());
            self.statuses.push(ServerStatus::with_timeout(address, self.timeout));
        }
        let available = board.values().filter(|report| report.available).count();
        info!(available, watched = board.len(), "refreshed server pool");
        self.board.store(Arc::new(board));
    }

    pub async fn run(mut self, interval: Duration) {
        loop {
            let sleep = tokio::time::sleep(interval);
            select! {
                () = sleep => {},
                () = vss::shutdown_signal() => break,
            }
            self.refresh().await;
        }
    }
}
