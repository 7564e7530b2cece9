use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use driver::Driver;
use log::{info, warn};
use service_abi::Participant;
use transport::{CancelToken, Endpoint, MemoryStore, RecordResult, StoreHandle, Waiter};
use triangulator::Triangulator;

use crate::client::Client;
use crate::config::SessionConfig;

/// Final report of one participant thread.
#[derive(Debug)]
pub struct Exit {
    /// Thread name: `driver` or `T<n>`.
    pub name: String,
    /// `Err` only when the session was cancelled under the participant.
    pub result: RecordResult<()>,
}

impl Exit {
    /// Whether the participant left through `SHUTDOWN`.
    pub fn is_clean(&self) -> bool {
        self.result.is_ok()
    }
}

struct Worker {
    name: String,
    handle: JoinHandle<()>,
}

/// A running driver plus its triangulators, one OS thread each.
pub struct Session {
    config: SessionConfig,
    store: StoreHandle,
    waiter: Waiter,
    workers: Vec<Worker>,
    exits: Receiver<Exit>,
}

impl Session {
    /// Starts a session over a fresh [`MemoryStore`].
    pub fn start_in_memory(config: SessionConfig) -> Result<Self> {
        let store: StoreHandle = Arc::new(MemoryStore::new(config.read_semantics));
        Self::start_with_store(config, store)
    }

    /// Starts a session over `store`, which must apply the configured read
    /// semantics.
    ///
    /// The driver seeds the matrices before any thread starts, so
    /// triangulators never observe missing matrix records.
    pub fn start_with_store(config: SessionConfig, store: StoreHandle) -> Result<Self> {
        config.validate()?;
        let waiter = Waiter::new(config.wait, CancelToken::new());
        let endpoint = Endpoint::new(store.clone(), waiter.clone());

        let mut driver = Driver::new(endpoint.clone(), config.driver_config());
        driver.initialize().context("initializing driver")?;

        let (tx, exits) = unbounded();
        let mut session = Self {
            config,
            store,
            waiter,
            workers: Vec::new(),
            exits,
        };
        for index in session.config.roster() {
            let config = session.config.triangulator_config(index);
            session.spawn(Triangulator::new(endpoint.clone(), config), tx.clone())?;
        }
        session.spawn(driver, tx)?;
        info!(
            "session: started driver and {} triangulator(s)",
            session.config.triangulators
        );
        Ok(session)
    }

    fn spawn<P>(&mut self, mut participant: P, exits: Sender<Exit>) -> Result<()>
    where
        P: Participant + 'static,
    {
        let name = participant.name();
        let thread_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let result = participant.run();
                match &result {
                    Ok(()) => info!("{name}: exited"),
                    Err(err) => warn!("{name}: {err}"),
                }
                // The session may already be gone.
                let _ = exits.send(Exit { name, result });
            })
            .with_context(|| format!("spawning {thread_name}"))?;
        self.workers.push(Worker {
            name: thread_name,
            handle,
        });
        Ok(())
    }

    /// A new application-side client on this session's store.
    pub fn client(&self) -> Client {
        Client::new(
            Endpoint::new(self.store.clone(), self.waiter.clone()),
            self.config.dims,
            self.config.read_semantics,
        )
    }

    /// Settings the session was started with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The record store every participant shares.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Next participant exit, if one has been reported.
    pub fn try_exit(&self) -> Option<Exit> {
        self.exits.try_recv().ok()
    }

    /// Trips the shared cancellation token; every blocked open returns
    /// `Cancelled`.
    pub fn cancel(&self) {
        self.waiter.cancel.cancel();
    }

    /// Sends `SHUTDOWN` through the driver and waits for every thread.
    pub fn shutdown(self) -> Result<Vec<Exit>> {
        self.client().shutdown()?;
        self.join()
    }

    /// Waits for every participant thread and collects their exits.
    pub fn join(mut self) -> Result<Vec<Exit>> {
        self.join_workers()?;
        Ok(self.exits.try_iter().collect())
    }

    fn join_workers(&mut self) -> Result<()> {
        let mut panicked = Vec::new();
        for worker in self.workers.drain(..) {
            if worker.handle.join().is_err() {
                panicked.push(worker.name);
            }
        }
        if panicked.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("participant(s) panicked: {}", panicked.join(", ")))
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.cancel();
        if let Err(err) = self.join_workers() {
            warn!("session: {err}");
        }
    }
}
