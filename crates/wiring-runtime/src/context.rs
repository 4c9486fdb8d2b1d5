//! Per-request creation bookkeeping.
//!
//! A [`CreationContext`] lives for exactly one top-level `get_instance` call.
//! It tracks which entries are in flight (to detect cycles), journals every
//! step for error traces, and queues instances whose properties still have
//! to be injected.

use std::fmt;

use wiring_common::error::{Result, WiringError};
use wiring_common::types::{Lifetime, Value};

/// Kind of step recorded in the creation trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Obtaining an entry, from cache or by creating it.
    Get,
    /// Building a fresh instance of an entry.
    Create,
    /// Injecting properties into an already built instance.
    Populate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Populate => write!(f, "populate"),
        }
    }
}

#[derive(Debug, Clone)]
struct Frame {
    operation: Operation,
    id: String,
}

#[derive(Debug, Clone)]
struct JournalLine {
    depth: usize,
    enter: bool,
    operation: Operation,
    id: String,
}

/// An instance waiting for property injection.
#[derive(Debug, Clone)]
pub struct Deferred {
    /// The constructed instance.
    pub instance: Value,
    /// Entry whose properties apply.
    pub entry_id: String,
    /// Chain of per-request entries whose population led to this one;
    /// `None` for singletons.
    lineage: Option<Vec<String>>,
}

/// Trace stack, journal, and deferred-population queue for one request.
#[derive(Debug, Default)]
pub struct CreationContext {
    stack: Vec<Frame>,
    journal: Vec<JournalLine>,
    deferred: Vec<Deferred>,
    populating: Option<Deferred>,
    committed: Vec<String>,
}

impl CreationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a step.
    ///
    /// # Errors
    ///
    /// Returns a cyclic-dependency error if the same step for the same entry
    /// is already in flight. The context is left unchanged in that case.
    pub fn push(&mut self, operation: Operation, id: &str) -> Result<()> {
        if let Some(start) = self
            .stack
            .iter()
            .position(|frame| frame.operation == operation && frame.id == id)
        {
            return Err(WiringError::CyclicDependency {
                id: id.to_owned(),
                path: self.cycle_path(start, id),
            });
        }
        self.journal.push(JournalLine {
            depth: self.stack.len(),
            enter: true,
            operation,
            id: id.to_owned(),
        });
        self.stack.push(Frame {
            operation,
            id: id.to_owned(),
        });
        Ok(())
    }

    /// Leaves the innermost step.
    pub fn pop(&mut self, operation: Operation, id: &str) {
        debug_assert!(
            self.stack
                .last()
                .is_some_and(|frame| frame.operation == operation && frame.id == id),
            "unbalanced trace: leaving {operation} {id}"
        );
        let _ = self.stack.pop();
        self.journal.push(JournalLine {
            depth: self.stack.len(),
            enter: false,
            operation,
            id: id.to_owned(),
        });
    }

    /// Queues `instance` of `entry_id` for property population.
    ///
    /// # Errors
    ///
    /// Returns a cyclic-dependency error if a per-request entry would be
    /// queued again by its own population chain, which could never drain.
    pub fn defer(&mut self, instance: Value, entry_id: &str, lifetime: Lifetime) -> Result<()> {
        let lineage = match &self.populating {
            Some(Deferred {
                lineage: Some(chain),
                entry_id: parent,
                ..
            }) => {
                let mut chain = chain.clone();
                chain.push(parent.clone());
                chain
            }
            _ => Vec::new(),
        };
        let repeat = lineage.iter().position(|id| id == entry_id);
        if let (Lifetime::PerRequest, Some(start)) = (lifetime, repeat) {
            let mut path = lineage[start..].to_vec();
            path.push(entry_id.to_owned());
            return Err(WiringError::CyclicDependency {
                id: entry_id.to_owned(),
                path,
            });
        }
        // singletons are built once per container, so their chain cannot repeat
        let lineage = (lifetime == Lifetime::PerRequest).then_some(lineage);
        self.deferred.push(Deferred {
            instance,
            entry_id: entry_id.to_owned(),
            lineage,
        });
        Ok(())
    }

    /// Takes the next queued population job, most recently queued first.
    ///
    /// The job stays visible through [`unpopulated`](Self::unpopulated)
    /// until [`finish_population`](Self::finish_population) is called.
    pub fn next_deferred(&mut self) -> Option<Deferred> {
        let job = self.deferred.pop()?;
        self.populating = Some(job.clone());
        Some(job)
    }

    /// Marks the current population job as complete.
    pub fn finish_population(&mut self) {
        self.populating = None;
    }

    /// Jobs that are queued or in progress.
    pub fn unpopulated(&self) -> impl Iterator<Item = &Deferred> {
        self.deferred.iter().chain(self.populating.iter())
    }

    /// Records that the singleton `id` was added to the instance cache.
    pub fn record_commit(&mut self, id: &str) {
        self.committed.push(id.to_owned());
    }

    /// Singletons added to the instance cache during this request.
    pub fn committed(&self) -> impl Iterator<Item = &str> {
        self.committed.iter().map(String::as_str)
    }

    fn cycle_path(&self, start: usize, id: &str) -> Vec<String> {
        let mut path: Vec<String> = Vec::new();
        for frame in &self.stack[start..] {
            if path.last() != Some(&frame.id) {
                path.push(frame.id.clone());
            }
        }
        path.push(id.to_owned());
        path
    }
}

impl fmt::Display for CreationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.journal {
            let sign = if line.enter { '+' } else { '-' };
            writeln!(
                f,
                "{:indent$}{sign} {} {}",
                "",
                line.operation,
                line.id,
                indent = line.depth * 2
            )?;
        }
        Ok(())
    }
}
