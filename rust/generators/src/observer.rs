// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter edits and the regeneration they trigger.
//!
//! Hosts never mutate stored parameters directly. They edit a
//! [`ParameterHandle`], which hands the new value to a
//! [`RegenerationObserver`] and keeps it only if regeneration succeeded.

use tracing::debug;

use crate::error::Result;
use crate::index::InstanceId;
use crate::params::GeneratorParameters;

/// New parameters for one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RegenerationRequest {
    pub instance: InstanceId,
    pub parameters: GeneratorParameters,
}

/// Consumer of parameter changes, typically the owning [`crate::Building`].
pub trait RegenerationObserver {
    fn parameters_changed(&mut self, request: RegenerationRequest) -> Result<()>;
}

/// Host-side copy of an instance's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterHandle {
    instance: InstanceId,
    parameters: GeneratorParameters,
}

impl ParameterHandle {
    pub fn new(instance: InstanceId, parameters: GeneratorParameters) -> Self {
        Self { instance, parameters }
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn parameters(&self) -> &GeneratorParameters {
        &self.parameters
    }

    /// Applies `change` and notifies `observer` synchronously.
    ///
    /// Edits that leave the parameters unchanged emit nothing. If the
    /// observer fails the handle keeps its previous value.
    pub fn edit<O, F>(&mut self, observer: &mut O, change: F) -> Result<()>
    where
        O: RegenerationObserver + ?Sized,
        F: FnOnce(&mut GeneratorParameters),
    {
        let mut next = self.parameters.clone();
        change(&mut next);
        if next == self.parameters {
            debug!(instance = %self.instance, "parameter edit is a no-op");
            return Ok(());
        }
        observer.parameters_changed(RegenerationRequest {
            instance: self.instance,
            parameters: next.clone(),
        })?;
        self.parameters = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::params::WindowParameters;

    #[derive(Default)]
    struct Recorder {
        requests: Vec<RegenerationRequest>,
        fail: bool,
    }

    impl RegenerationObserver for Recorder {
        fn parameters_changed(&mut self, request: RegenerationRequest) -> Result<()> {
            if self.fail {
                return Err(Error::InvalidPlacement("rejected".into()));
            }
            self.requests.push(request);
            Ok(())
        }
    }

    fn set_count(count: u32) -> impl FnOnce(&mut GeneratorParameters) {
        move |p| {
            if let GeneratorParameters::Window(w) = p {
                w.count = count;
            }
        }
    }

    #[test]
    fn edit_emits_one_request() {
        let mut handle = ParameterHandle::new(InstanceId(4), GeneratorParameters::Window(WindowParameters::default()));
        let mut recorder = Recorder::default();
        handle.edit(&mut recorder, set_count(2)).unwrap();

        assert_eq!(recorder.requests.len(), 1);
        assert_eq!(recorder.requests[0].instance, InstanceId(4));
        assert_eq!(&recorder.requests[0].parameters, handle.parameters());
    }

    #[test]
    fn unchanged_edit_is_silent() {
        let mut handle = ParameterHandle::new(InstanceId(0), GeneratorParameters::Window(WindowParameters::default()));
        let mut recorder = Recorder::default();
        handle.edit(&mut recorder, set_count(1)).unwrap();
        assert!(recorder.requests.is_empty());
    }

    #[test]
    fn rejected_edit_keeps_old_value() {
        let original = GeneratorParameters::Window(WindowParameters::default());
        let mut handle = ParameterHandle::new(InstanceId(0), original.clone());
        let mut recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        assert!(handle.edit(&mut recorder, set_count(9)).is_err());
        assert_eq!(handle.parameters(), &original);
    }
}
