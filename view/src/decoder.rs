use {
    crate::{
        logs,
        query::ViewQuery,
        scale::{FormattedValue, OmnipairScaling, ScalingPolicy},
    },
    omnipair_harness_error::error::{HarnessError, HarnessResult},
};

/// Runs a view query as a non-committing simulation and yields its logs.
pub trait ViewSimulator {
    fn simulate_view(&self, query: &ViewQuery) -> HarnessResult<Vec<String>>;
}

/// Whether a getter logs one value or a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewArity {
    Single,
    Pair,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewValues {
    Single {
        raw: String,
        formatted: FormattedValue,
    },
    Pair {
        raw: (String, String),
        formatted: (FormattedValue, FormattedValue),
    },
}

/// A decoded view answer.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewResult {
    pub label: String,
    pub values: ViewValues,
}

impl ViewResult {
    /// The first (or only) formatted value.
    pub fn formatted(&self) -> FormattedValue {
        match &self.values {
            ViewValues::Single { formatted, .. } => *formatted,
            ViewValues::Pair { formatted, .. } => formatted.0,
        }
    }

    /// The first (or only) raw digit string.
    pub fn raw(&self) -> &str {
        match &self.values {
            ViewValues::Single { raw, .. } => raw,
            ViewValues::Pair { raw, .. } => &raw.0,
        }
    }
}

/// Decodes view answers out of simulation logs and scales them.
#[derive(Clone, Debug, Default)]
pub struct ViewDecoder<P: ScalingPolicy = OmnipairScaling> {
    policy: P,
}

impl ViewDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: ScalingPolicy> ViewDecoder<P> {
    pub fn with_policy(policy: P) -> Self {
        Self { policy }
    }

    pub fn decode(&self, label: &str, arity: ViewArity, logs: &[String]) -> HarnessResult<ViewResult> {
        let values = match arity {
            ViewArity::Single => {
                let capture = logs::find_single(logs, label)?
                    .ok_or_else(|| HarnessError::ViewValueNotFound(label.to_string()))?;
                let raw = logs::extract_digits(&capture);
                let formatted = self.policy.scale_for(label, 0).apply(&raw);
                ViewValues::Single { raw, formatted }
            }
            ViewArity::Pair => {
                let (first, second) = logs::find_pair(logs, label)?
                    .ok_or_else(|| HarnessError::ViewValueNotFound(label.to_string()))?;
                let raw = (logs::extract_digits(&first), logs::extract_digits(&second));
                let formatted = (
                    self.policy.scale_for(label, 0).apply(&raw.0),
                    self.policy.scale_for(label, 1).apply(&raw.1),
                );
                ViewValues::Pair { raw, formatted }
            }
        };
        Ok(ViewResult {
            label: label.to_string(),
            values,
        })
    }

    /// Simulate `query` and decode its answer. A failed simulation is
    /// returned as is, without looking at the logs.
    pub fn query<S: ViewSimulator>(
        &self,
        simulator: &S,
        query: &ViewQuery,
        arity: ViewArity,
    ) -> HarnessResult<ViewResult> {
        let logs = simulator.simulate_view(query)?;
        log::debug!("View {} produced {} log lines", query.label(), logs.len());
        self.decode(query.label(), arity, &logs)
    }
}
