//! # Station Actor
//!
//! The worker loop each actor thread runs against the shared station state.
//!
//! ## Protocol
//! 1. Join the admission queue once.
//! 2. Wait until the front of the queue is this actor (or the station stops).
//! 3. Acquire a resource, blocking until one is idle.
//! 4. Pop itself off the queue. An actor never leaves the line before a
//!    resource is in hand, so the head of the line always gets served.
//! 5. Hold the resource for the service duration and count the service.
//! 6. Release the resource, then rejoin the back of the queue.
//! 7. Stop if the stop signal is raised, otherwise go back to 2.
//!
//! Only the head of the line ever contends for a resource, which keeps service
//! order strictly FIFO among actors. Neither structure's lock is held while
//! blocking on the other.

use std::sync::Arc;

use tracing::trace;
use turnstile_api::actor::{Actor, ActorExit, ActorState};
use turnstile_api::errors::ActorFault;
use turnstile_api::event::ServiceEvent;
use turnstile_api::types::ActorId;

use crate::thread::config::WaitStrategy;
use crate::thread::counter::UsageCounter;
use crate::thread::pool::ResourceLease;
use crate::thread::station::StationContext;
use crate::{actor_span, log_error, log_lifecycle, log_service};

/// An actor that repeatedly lines up for a station resource.
#[derive(Debug)]
pub struct StationActor {
    id: ActorId,
    /// Shared with the station, which reads it after joining this actor's thread
    usage: Arc<UsageCounter>,
    state: ActorState,
}

impl StationActor {
    pub fn new(id: ActorId, usage: Arc<UsageCounter>) -> Self {
        Self {
            id,
            usage,
            state: ActorState::Enqueuing,
        }
    }

    fn transition(&mut self, next: ActorState) {
        trace!(
            from = ?self.state,
            to = ?next,
            holding = next.holds_resource(),
            "actor state"
        );
        self.state = next;
    }

    fn join_line(&self, ctx: &StationContext) {
        let ticket = ctx.line().push(self.id);
        ctx.journal().record(|| ServiceEvent::Joined {
            actor: self.id,
            ticket,
            at: ctx.clock().elapsed(),
        });
        log_service!("joined", ticket);
    }

    /// Waits until this actor is at the head of the line.
    ///
    /// # Returns
    /// `false` if the stop signal was observed instead.
    fn wait_turn(&self, ctx: &StationContext) -> bool {
        match ctx.wait_strategy() {
            WaitStrategy::Notify => {
                ctx.line().wait_front_until(|front| {
                    ctx.stop_signal().is_raised() || front == Some(&self.id)
                });
            }
            WaitStrategy::Poll { turn_interval, .. } => loop {
                if ctx.stop_signal().is_raised() {
                    break;
                }
                if matches!(ctx.line().peek_front(), Ok(front) if front == self.id) {
                    break;
                }
                ctx.clock().sleep(*turn_interval);
            },
        }
        !ctx.stop_signal().is_raised()
    }

    fn acquire<'c>(&self, ctx: &'c StationContext) -> Result<ResourceLease<'c>, ActorFault> {
        if let WaitStrategy::Poll {
            resource_interval, ..
        } = ctx.wait_strategy()
        {
            while ctx.pool().is_empty() {
                ctx.clock().sleep(*resource_interval);
            }
        }

        let lease = ctx.pool().acquire()?;
        ctx.journal().record(|| ServiceEvent::Acquired {
            actor: self.id,
            resource: lease.id(),
            at: ctx.clock().elapsed(),
        });
        log_service!("acquired", resource = %lease.id());
        Ok(lease)
    }

    fn leave_line(&self, ctx: &StationContext) -> Result<(), ActorFault> {
        match ctx.line().try_pop_front() {
            Some(front) if front == self.id => Ok(()),
            found => Err(ActorFault::OutOfTurn {
                expected: self.id,
                found,
            }),
        }
    }

    fn serve(&self, ctx: &StationContext, lease: &ResourceLease<'_>) {
        ctx.clock().sleep(ctx.service_duration());
        lease.resource().usage().increment();
        let services = self.usage.increment();
        log_service!("served", resource = %lease.id(), services);
    }

    fn release(&self, ctx: &StationContext, lease: ResourceLease<'_>) {
        let resource = lease.id();
        ctx.journal().record(|| ServiceEvent::Released {
            actor: self.id,
            resource,
            at: ctx.clock().elapsed(),
        });
        lease.release();
        log_service!("released", resource = %resource);
    }
}

impl Actor for StationActor {
    type Context = StationContext;

    fn id(&self) -> ActorId {
        self.id
    }

    fn run(&mut self, ctx: &StationContext) -> ActorExit {
        let span = actor_span!(ctx.actor_label(), self.id);
        let _guard = span.enter();

        self.transition(ActorState::Enqueuing);
        self.join_line(ctx);

        let exit = loop {
            self.transition(ActorState::WaitingTurn);
            if !self.wait_turn(ctx) {
                break ActorExit::Stopped;
            }

            self.transition(ActorState::WaitingResource);
            let lease = match self.acquire(ctx) {
                Ok(lease) => lease,
                Err(fault) => break ActorExit::Faulted(fault),
            };
            if let Err(fault) = self.leave_line(ctx) {
                self.release(ctx, lease);
                break ActorExit::Faulted(fault);
            }

            self.transition(ActorState::InService);
            self.serve(ctx, &lease);

            // Release before rejoining so the freed resource is visible first.
            self.transition(ActorState::Requeuing);
            self.release(ctx, lease);
            self.join_line(ctx);

            if ctx.stop_signal().is_raised() {
                break ActorExit::Stopped;
            }
        };

        match &exit {
            ActorExit::Faulted(fault) => {
                log_error!(fault, actor = %self.id, "actor left the station early");
                self.transition(ActorState::Faulted);
            }
            _ => {
                self.transition(ActorState::Stopped);
                log_lifecycle!(ctx.actor_label(), self.id, "stopped", services = self.usage.get());
            }
        }
        debug_assert!(self.state.is_terminal());
        ctx.journal().record(|| ServiceEvent::Exited {
            actor: self.id,
            exit: exit.clone(),
        });
        exit
    }

    fn state(&self) -> ActorState {
        self.state
    }
}
