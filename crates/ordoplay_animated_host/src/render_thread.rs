// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render thread executor.
//!
//! The manager is not thread-safe. It lives on a dedicated thread and every
//! command, frame tick and event reaches it through one queue, so they run
//! in the order they were sent. Failures are logged on the render thread
//! and reported back on a second queue.

use crate::command::Command;
use crate::config::HostConfig;
use crate::error::{HostError, Result};
use ordoplay_animated_graph::{
    AnimatedError, AnimatedEvent, AnimatedNodesManager, HostEventEmitter, PropsSink,
};
use std::fmt;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

/// Closure run on the render thread with the manager
pub type RenderTask = Box<dyn FnOnce(&mut AnimatedNodesManager) + Send>;

/// Work item for the render thread
pub enum HostCommand {
    /// Graph command
    Apply(Command),
    /// Frame tick
    Frame {
        /// Frame timestamp
        frame_time_nanos: i64,
    },
    /// View event
    Event(AnimatedEvent),
    /// Arbitrary work, for callbacks and listeners
    Task(RenderTask),
    /// Stop the thread once everything queued before is done
    Shutdown,
}

impl HostCommand {
    fn description(&self) -> String {
        match self {
            Self::Apply(command) => command.description(),
            Self::Frame { frame_time_nanos } => format!("frame at {frame_time_nanos}ns"),
            Self::Event(event) => format!("{} from view [{}]", event.name, event.view_tag),
            Self::Task(_) => "task".to_string(),
            Self::Shutdown => "shutdown".to_string(),
        }
    }
}

impl fmt::Debug for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply(command) => f.debug_tuple("Apply").field(command).finish(),
            Self::Frame { frame_time_nanos } => f
                .debug_struct("Frame")
                .field("frame_time_nanos", frame_time_nanos)
                .finish(),
            Self::Event(event) => f.debug_tuple("Event").field(event).finish(),
            Self::Task(_) => f.write_str("Task"),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// A command that failed on the render thread
#[derive(Debug)]
pub struct CommandFailure {
    /// Description of the command
    pub command: String,
    /// Error it returned
    pub error: AnimatedError,
}

/// Cloneable sender of work to the render thread
#[derive(Debug, Clone)]
pub struct RenderHandle {
    commands: mpsc::UnboundedSender<HostCommand>,
}

impl RenderHandle {
    /// Queue any work item
    pub fn send(&self, command: HostCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| HostError::RenderThreadStopped)
    }

    /// Queue a graph command
    pub fn apply(&self, command: Command) -> Result<()> {
        self.send(HostCommand::Apply(command))
    }

    /// Queue a frame tick
    pub fn frame(&self, frame_time_nanos: i64) -> Result<()> {
        self.send(HostCommand::Frame { frame_time_nanos })
    }

    /// Queue a view event
    pub fn dispatch_event(&self, event: AnimatedEvent) -> Result<()> {
        self.send(HostCommand::Event(event))
    }

    /// Queue a closure
    pub fn run(&self, task: impl FnOnce(&mut AnimatedNodesManager) + Send + 'static) -> Result<()> {
        self.send(HostCommand::Task(Box::new(task)))
    }

    /// Run a closure on the render thread and wait for its result.
    ///
    /// Blocks the caller; must not be called from the render thread.
    pub fn query<T: Send + 'static>(
        &self,
        query: impl FnOnce(&mut AnimatedNodesManager) -> T + Send + 'static,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.run(move |manager| {
            // The caller may have given up waiting
            let _ = reply_tx.send(query(manager));
        })?;
        reply_rx
            .blocking_recv()
            .map_err(|_| HostError::RenderThreadStopped)
    }
}

/// Dedicated thread owning an [`AnimatedNodesManager`]
#[derive(Debug)]
pub struct RenderThread {
    handle: RenderHandle,
    failures: mpsc::UnboundedReceiver<CommandFailure>,
    thread: Option<JoinHandle<()>>,
}

impl RenderThread {
    /// Start the thread with a manager built from `config`
    pub fn spawn(
        config: &HostConfig,
        sink: impl PropsSink + Send + 'static,
        emitter: impl HostEventEmitter + Send + 'static,
    ) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (failure_tx, failure_rx) = mpsc::unbounded_channel();
        let policy = config.consistency;

        let thread = std::thread::Builder::new()
            .name("ordoplay-animated-render".to_string())
            .spawn(move || {
                let manager = AnimatedNodesManager::new(sink, emitter).with_policy(policy);
                render_worker(manager, command_rx, failure_tx);
            })
            .map_err(HostError::Spawn)?;

        Ok(Self {
            handle: RenderHandle {
                commands: command_tx,
            },
            failures: failure_rx,
            thread: Some(thread),
        })
    }

    /// Handle for queueing work from any thread
    pub fn handle(&self) -> RenderHandle {
        self.handle.clone()
    }

    /// Failures reported since the last poll
    pub fn poll_failures(&mut self) -> Vec<CommandFailure> {
        let mut failures = Vec::new();
        while let Ok(failure) = self.failures.try_recv() {
            failures.push(failure);
        }
        failures
    }

    /// Finish queued work, stop the thread and return the failures not
    /// polled yet
    pub fn shutdown(mut self) -> Result<Vec<CommandFailure>> {
        self.stop()?;
        Ok(self.poll_failures())
    }

    fn stop(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        // Already gone if the send fails; join reports how it ended
        let _ = self.handle.send(HostCommand::Shutdown);
        thread.join().map_err(|_| HostError::RenderThreadPanicked)
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!("Render thread did not stop cleanly: {}", e);
        }
    }
}

/// Process work items until shutdown or until every handle is dropped
fn render_worker(
    mut manager: AnimatedNodesManager,
    mut commands: mpsc::UnboundedReceiver<HostCommand>,
    failures: mpsc::UnboundedSender<CommandFailure>,
) {
    tracing::debug!("Render thread started");
    while let Some(command) = commands.blocking_recv() {
        let description = command.description();
        let result = match command {
            HostCommand::Apply(command) => command.execute(&mut manager),
            HostCommand::Frame { frame_time_nanos } => manager.run_updates(frame_time_nanos),
            HostCommand::Event(event) => manager.on_event_dispatch(&event).map(|_| ()),
            HostCommand::Task(task) => {
                task(&mut manager);
                Ok(())
            }
            HostCommand::Shutdown => break,
        };

        if let Err(error) = result {
            tracing::warn!("{} failed: {}", description, error);
            // Nobody is listening once the owner is dropped
            let _ = failures.send(CommandFailure {
                command: description,
                error,
            });
        }
    }
    tracing::debug!("Render thread stopped");
}
