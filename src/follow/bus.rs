/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 12/11/25
******************************************************************************/

//! Single-consumer event bus runners.
//!
//! Gateways push [`MarketEvent`]s and operators push [`FollowCommand`]s
//! from any thread; one consumer loop owns the engine and drains them in
//! arrival order. Two runners are provided: `FollowBusStd` over standard
//! library mpsc channels and `FollowBusTokio` over Tokio channels.

use crate::follow::engine::{FollowCommand, FollowEngine};
use crate::follow::events::MarketEvent;
use crate::follow::gateway::Gateway;
use std::time::Duration;
use tracing::info;

/// One message on the bus.
#[derive(Debug, Clone)]
pub enum BusMessage {
    /// Gateway event.
    Event(MarketEvent),
    /// Operator command.
    Command(FollowCommand),
}

/// Event bus over standard library mpsc channels with a consumer thread.
pub struct FollowBusStd {
    sender: std::sync::mpsc::Sender<BusMessage>,
    receiver: Option<std::sync::mpsc::Receiver<BusMessage>>,
}

impl FollowBusStd {
    /// Create a new bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = std::sync::mpsc::channel();
        Self {
            sender,
            receiver: Some(receiver),
        }
    }

    /// A producer handle. Clone freely across gateway threads.
    #[must_use]
    pub fn sender(&self) -> std::sync::mpsc::Sender<BusMessage> {
        self.sender.clone()
    }

    /// Start the consumer loop on its own thread. The loop runs until
    /// every sender is dropped — the bus keeps one itself, so drop the bus
    /// too — then hands the engine back through the join handle.
    pub fn start<G>(&mut self, mut engine: FollowEngine<G>) -> std::thread::JoinHandle<FollowEngine<G>>
    where
        G: Gateway + 'static,
    {
        let receiver = self
            .receiver
            .take()
            .expect("engine loop already started");

        std::thread::spawn(move || {
            info!("follow engine loop started");
            while let Ok(message) = receiver.recv() {
                match message {
                    BusMessage::Event(event) => engine.handle_event(event),
                    BusMessage::Command(command) => engine.handle_command(command),
                }
            }
            info!("follow engine loop stopped");
            engine
        })
    }

    /// Start a 1 Hz timer feeding [`MarketEvent::Timer`] into the bus.
    /// The thread exits when the consumer side is gone.
    pub fn start_timer(&self, period: Duration) -> std::thread::JoinHandle<()> {
        let sender = self.sender();
        std::thread::spawn(move || {
            loop {
                std::thread::sleep(period);
                if sender.send(BusMessage::Event(MarketEvent::Timer)).is_err() {
                    break;
                }
            }
        })
    }
}

impl Default for FollowBusStd {
    fn default() -> Self {
        Self::new()
    }
}

/// Event bus over Tokio unbounded mpsc channels with a consumer task.
pub struct FollowBusTokio {
    sender: tokio::sync::mpsc::UnboundedSender<BusMessage>,
    receiver: Option<tokio::sync::mpsc::UnboundedReceiver<BusMessage>>,
}

impl FollowBusTokio {
    /// Create a new bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Some(receiver),
        }
    }

    /// A producer handle. Clone freely across tasks and threads.
    #[must_use]
    pub fn sender(&self) -> tokio::sync::mpsc::UnboundedSender<BusMessage> {
        self.sender.clone()
    }

    /// Start the consumer loop as an async task. The task runs until every
    /// sender is dropped — the bus keeps one itself, so drop the bus too —
    /// then hands the engine back through the join handle.
    pub fn start<G>(&mut self, mut engine: FollowEngine<G>) -> tokio::task::JoinHandle<FollowEngine<G>>
    where
        G: Gateway + 'static,
    {
        let mut receiver = self
            .receiver
            .take()
            .expect("engine loop already started");

        tokio::spawn(async move {
            info!("follow engine loop started");
            while let Some(message) = receiver.recv().await {
                match message {
                    BusMessage::Event(event) => engine.handle_event(event),
                    BusMessage::Command(command) => engine.handle_command(command),
                }
            }
            info!("follow engine loop stopped");
            engine
        })
    }

    /// Start a periodic timer task feeding [`MarketEvent::Timer`] into the
    /// bus. The task exits when the consumer side is gone.
    pub fn start_timer(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        let sender = self.sender();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately; skip it so the cadence
            // starts one period from now.
            interval.tick().await;
            loop {
                interval.tick().await;
                if sender.send(BusMessage::Event(MarketEvent::Timer)).is_err() {
                    break;
                }
            }
        })
    }
}

impl Default for FollowBusTokio {
    fn default() -> Self {
        Self::new()
    }
}
