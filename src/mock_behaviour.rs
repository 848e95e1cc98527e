//! This module provides ways to tweak a mocked calendar service, so that it can return errors on some tests

use std::error::Error;

/// This stores some behaviour tweaks, that describe how a mocked service will behave during a given test
///
/// So that a function fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    pub list_calendars_behaviour: (u32, u32),
    pub list_events_behaviour: (u32, u32),
    pub insert_event_behaviour: (u32, u32),
    pub patch_event_behaviour: (u32, u32),
    pub remove_event_behaviour: (u32, u32),
    pub find_or_create_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            list_calendars_behaviour: (0, n_fails),
            list_events_behaviour: (0, n_fails),
            insert_event_behaviour: (0, n_fails),
            patch_event_behaviour: (0, n_fails),
            remove_event_behaviour: (0, n_fails),
            find_or_create_behaviour: (0, n_fails),
        }
    }

    pub fn can_list_calendars(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.list_calendars_behaviour, "list_calendars")
    }
    pub fn can_list_events(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.list_events_behaviour, "list_events")
    }
    pub fn can_insert_event(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.insert_event_behaviour, "insert_event")
    }
    pub fn can_patch_event(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.patch_event_behaviour, "patch_event")
    }
    pub fn can_remove_event(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.remove_event_behaviour, "remove_event")
    }
    pub fn can_find_or_create(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.find_or_create_behaviour, "find_or_create_calendar")
    }
}

/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), Box<dyn Error>> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 = value.0 - 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else {
        if remaining_failures > 0 {
            value.1 = value.1 - 1;
            log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
            Err(format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value).into())
        } else {
            log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mock_behaviour() {
        let mut ok = MockBehaviour::new();
        assert!(ok.can_list_calendars().is_ok());
        assert!(ok.can_list_calendars().is_ok());
        assert!(ok.can_list_calendars().is_ok());
        assert!(ok.can_insert_event().is_ok());

        let mut now = MockBehaviour::fail_now(2);
        assert!(now.can_list_calendars().is_err());
        assert!(now.can_insert_event().is_err());
        assert!(now.can_insert_event().is_err());
        assert!(now.can_list_calendars().is_err());
        assert!(now.can_list_calendars().is_ok());
        assert!(now.can_insert_event().is_ok());

        let mut custom = MockBehaviour {
            list_events_behaviour: (0, 1),
            patch_event_behaviour: (1, 3),
            ..MockBehaviour::default()
        };
        assert!(custom.can_list_events().is_err());
        assert!(custom.can_list_events().is_ok());
        assert!(custom.can_list_events().is_ok());
        assert!(custom.can_patch_event().is_ok());
        assert!(custom.can_patch_event().is_err());
        assert!(custom.can_patch_event().is_err());
        assert!(custom.can_patch_event().is_err());
        assert!(custom.can_patch_event().is_ok());
        assert!(custom.can_patch_event().is_ok());
    }
}
