//! Sequential execution of dependent operations.
//!
//! # Design
//! A chain is a queue of step handlers plus one pending operation. `start`
//! asks a provider for the first operation, then loops: compile, send, parse,
//! and hand the outcome to the next handler. The handler receives the chain
//! context by value and gives it back inside `Flow`, optionally queuing the
//! next operation on the `Chainer`. State that later steps need (a session
//! token, an object id) therefore travels in the context, never in captured
//! mutable variables.
//!
//! Exactly one operation is in flight per chain. Failures never stop the
//! executor on their own: the handler sees the `ApiError` and decides.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::client::AccountClient;
use crate::error::{ApiError, ChainError};
use crate::operation::Operation;
use crate::result::OperationResult;
use crate::transport::{self, Transporter};

/// What a step handler receives for its operation.
pub type StepOutcome = Result<OperationResult, ApiError>;

/// A queued step handler.
pub type StepHandler<C> = Box<dyn FnOnce(StepOutcome, C, &mut Chainer) -> Flow<C> + Send>;

/// A handler's verdict, carrying the (possibly updated) context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow<C> {
    /// Keep going if an operation was queued; otherwise the chain completes.
    Continue(C),
    /// Stop now.
    Abort(C),
}

impl<C> Flow<C> {
    /// `Continue` when `proceed` is true, `Abort` otherwise.
    pub fn from_bool(proceed: bool, context: C) -> Self {
        if proceed {
            Flow::Continue(context)
        } else {
            Flow::Abort(context)
        }
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, Flow::Continue(_))
    }

    pub fn into_context(self) -> C {
        match self {
            Flow::Continue(context) | Flow::Abort(context) => context,
        }
    }
}

/// Lifecycle of a `ChainExecutor`. Steps are numbered from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Idle,
    Running { step: usize },
    Completed { steps: usize },
    Aborted { step: usize },
}

/// Handle through which a provider or handler queues the next operation.
#[derive(Debug, Default)]
pub struct Chainer {
    next: Option<Operation>,
}

impl Chainer {
    /// Queue `op` as the next step. A second call replaces the first.
    pub fn add(&mut self, op: Operation) {
        if let Some(replaced) = self.next.replace(op) {
            warn!(kind = ?replaced.kind(), "replacing queued chain operation");
        }
    }

    pub fn pending(&self) -> Option<&Operation> {
        self.next.as_ref()
    }

    fn take(&mut self) -> Option<Operation> {
        self.next.take()
    }
}

/// How a chain run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport<C> {
    pub state: ChainState,
    /// Number of operations sent to the transporter or failed to compile.
    pub steps: usize,
    pub context: C,
}

impl<C> ChainReport<C> {
    pub fn is_completed(&self) -> bool {
        matches!(self.state, ChainState::Completed { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.state, ChainState::Aborted { .. })
    }
}

/// Runs operations one after another, threading a context of type `C`.
pub struct ChainExecutor<C, T> {
    client: AccountClient,
    transporter: T,
    handlers: VecDeque<StepHandler<C>>,
    chainer: Chainer,
    state: ChainState,
}

impl<C, T> ChainExecutor<C, T>
where
    C: Send,
    T: Transporter,
{
    pub fn new(client: AccountClient, transporter: T) -> Self {
        Self {
            client,
            transporter,
            handlers: VecDeque::new(),
            chainer: Chainer::default(),
            state: ChainState::Idle,
        }
    }

    /// Append a step handler. Handlers run in the order they were added.
    pub fn then<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnOnce(StepOutcome, C, &mut Chainer) -> Flow<C> + Send + 'static,
    {
        self.handlers.push_back(Box::new(handler));
        self
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Handlers still waiting for a step.
    pub fn queued_handlers(&self) -> usize {
        self.handlers.len()
    }

    /// Run the chain to completion or abort.
    ///
    /// `provider` queues the first operation; if it queues nothing the chain
    /// completes without sending anything. A queued operation with no handler
    /// left to receive its outcome is dropped unsent.
    pub async fn start<F>(&mut self, context: C, provider: F) -> Result<ChainReport<C>, ChainError>
    where
        F: FnOnce(&C, &mut Chainer),
    {
        if self.state != ChainState::Idle {
            return Err(ChainError::NotIdle(self.state));
        }

        let mut context = context;
        provider(&context, &mut self.chainer);

        let mut step = 0;
        let state = loop {
            let Some(op) = self.chainer.take() else {
                break ChainState::Completed { steps: step };
            };
            let Some(handler) = self.handlers.pop_front() else {
                warn!(step, kind = ?op.kind(), "no step handler left; dropping queued operation");
                break ChainState::Completed { steps: step };
            };

            self.state = ChainState::Running { step };
            debug!(step, kind = ?op.kind(), "running chain step");
            let outcome = transport::execute(&self.client, &self.transporter, &op).await;
            if let Err(err) = &outcome {
                warn!(step, kind = ?op.kind(), error = %err, "chain step failed");
            }

            match handler(outcome, context, &mut self.chainer) {
                Flow::Continue(next) => {
                    context = next;
                    step += 1;
                }
                Flow::Abort(last) => {
                    context = last;
                    debug!(step, "chain aborted by step handler");
                    break ChainState::Aborted { step };
                }
            }
        };

        let steps = match state {
            ChainState::Aborted { step } => step + 1,
            _ => step,
        };
        self.handlers.clear();
        self.chainer = Chainer::default();
        self.state = state;
        Ok(ChainReport {
            state,
            steps,
            context,
        })
    }

    /// Drop queued handlers and any pending operation and return to `Idle`.
    pub fn reset(&mut self) {
        self.handlers.clear();
        self.chainer = Chainer::default();
        self.state = ChainState::Idle;
    }
}
