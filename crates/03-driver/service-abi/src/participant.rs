use transport::{RecordError, RecordResult};

use crate::{Failure, FailureKind};

/// What a participant does after handling one inbound event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// A `SHUTDOWN` was handled; the loop ends.
    Stop,
}

/// A poll loop over one inbound record.
///
/// `step` only returns `Err` when the participant's cancellation token
/// tripped; every other failure is reported and absorbed inside the step.
pub trait Participant: Send {
    fn name(&self) -> String;

    fn step(&mut self) -> RecordResult<Step>;

    fn run(&mut self) -> RecordResult<()> {
        while self.step()? == Step::Continue {}
        Ok(())
    }
}

/// Converts a structural record error into a reported [`Failure`] of `kind`,
/// letting cancellation through untouched.
///
/// Returns `Ok(None)` when the error was absorbed.
pub fn absorb<T>(
    result: RecordResult<T>,
    kind: FailureKind,
    report: impl FnOnce(Failure),
) -> RecordResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err @ RecordError::Cancelled { .. }) => Err(err),
        Err(err) => {
            report(Failure::new(kind, err));
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport::RecordId;

    #[test]
    fn absorb_reports_structural_errors_and_passes_cancellation() {
        let mut seen = Vec::new();
        let out = absorb::<()>(
            Err(RecordError::Empty),
            FailureKind::Event,
            |f| seen.push(f),
        )
        .unwrap();
        assert_eq!(out, None);
        assert_eq!(seen[0].kind, FailureKind::Event);

        let cancelled = absorb::<()>(
            Err(RecordError::Cancelled {
                id: RecordId::driver_in(),
            }),
            FailureKind::Event,
            |_| panic!("cancellation must not be reported"),
        );
        assert!(cancelled.unwrap_err().is_cancelled());
    }

    struct Countdown(u32);

    impl Participant for Countdown {
        fn name(&self) -> String {
            "countdown".into()
        }

        fn step(&mut self) -> RecordResult<Step> {
            self.0 -= 1;
            Ok(if self.0 == 0 { Step::Stop } else { Step::Continue })
        }
    }

    #[test]
    fn run_stops_on_the_first_stop() {
        let mut p = Countdown(3);
        p.run().unwrap();
        assert_eq!(p.0, 0);
    }
}
