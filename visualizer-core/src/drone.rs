//! # Drone Module
//!
//! Keeps the reference drone in line with the store: whenever the store
//! announces [`StoreEvent::DroneShouldUpdate`], the controller re-applies
//! the volume, releases whatever is sounding and, if the drone is on,
//! starts the tonic at the chosen octave.

use crate::NoteSpecError;
use crate::store::{DroneSettings, Store, StoreEvent};
use crate::theory::{Tonic, midi_to_note_name, parse_note};
use crate::tone::ToneEngine;
use log::{debug, error};
use std::time::Duration;

/// Note names the drone plays for a tonic at an octave.
///
/// # Returns
/// * `Ok(notes)` - Normalized note names, e.g. `["F♯3"]`
/// * `Err(e)` - The combination does not name a pitch
pub fn drone_notes(tonic: Tonic, octave: i32) -> Result<Vec<String>, NoteSpecError> {
    let midi = parse_note(&format!("{}{}", tonic.name(), octave))?;
    Ok(vec![midi_to_note_name(midi)])
}

pub struct DroneController<T> {
    engine: T,
}

impl<T: ToneEngine> DroneController<T> {
    pub fn new(engine: T) -> Self {
        Self { engine }
    }

    /// Brings the engine in line with the drone settings.
    ///
    /// If the note name cannot be built the drone stays released; the error is
    /// returned so the caller can log it.
    pub fn update(&mut self, drone: &DroneSettings, tonic: Tonic) -> Result<(), NoteSpecError> {
        self.engine.set_volume_db(drone.volume_db);
        self.engine.release_all();

        if drone.is_playing {
            let notes = drone_notes(tonic, drone.octave)?;
            debug!("Drone playing {notes:?} at {} dB", drone.volume_db);
            self.engine.trigger_notes(&notes, Duration::ZERO)?;
        }
        Ok(())
    }

    /// Hands the controller to the store, which then drives it on every
    /// drone update notification.
    pub fn attach(mut self, store: &mut Store)
    where
        T: 'static,
    {
        store.subscribe(move |event, state| {
            if *event == StoreEvent::DroneShouldUpdate {
                if let Err(e) = self.update(&state.drone, state.display.tonic) {
                    error!("Aborting drone update: {e}");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualizerConfig;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Volume(f32),
        ReleaseAll,
        Trigger(Vec<String>),
    }

    #[derive(Clone, Default)]
    struct RecordingEngine {
        calls: Rc<RefCell<Vec<Call>>>,
        rejects_notes: bool,
    }

    impl ToneEngine for RecordingEngine {
        fn connect(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn trigger_notes(&mut self, notes: &[String], _when: Duration) -> Result<(), NoteSpecError> {
            self.calls.borrow_mut().push(Call::Trigger(notes.to_vec()));
            if self.rejects_notes {
                return Err(NoteSpecError::UnknownName(notes.join(",")));
            }
            Ok(())
        }

        fn release_all(&mut self) {
            self.calls.borrow_mut().push(Call::ReleaseAll);
        }

        fn set_volume_db(&mut self, volume_db: f32) {
            self.calls.borrow_mut().push(Call::Volume(volume_db));
        }
    }

    #[test]
    fn notes_follow_tonic_and_octave() {
        assert_eq!(drone_notes(Tonic::parse("F#").unwrap(), 3), Ok(vec!["F♯3".to_string()]));
        assert_eq!(drone_notes(Tonic::parse("B♭").unwrap(), 2), Ok(vec!["A♯2".to_string()]));
    }

    #[test]
    fn store_drives_the_drone() {
        let engine = RecordingEngine::default();
        let calls = Rc::clone(&engine.calls);
        let mut store = Store::new(&VisualizerConfig::default());
        DroneController::new(engine).attach(&mut store);

        store.toggle_drone();
        assert_eq!(
            *calls.borrow(),
            vec![Call::Volume(-12.0), Call::ReleaseAll, Call::Trigger(vec!["C3".into()])]
        );

        calls.borrow_mut().clear();
        store.set_tonic(Tonic::parse("A").unwrap());
        assert_eq!(
            *calls.borrow(),
            vec![Call::Volume(-12.0), Call::ReleaseAll, Call::Trigger(vec!["A3".into()])]
        );

        calls.borrow_mut().clear();
        store.toggle_drone();
        assert_eq!(*calls.borrow(), vec![Call::Volume(-12.0), Call::ReleaseAll]);
    }

    #[test]
    fn unrelated_events_leave_the_drone_alone() {
        let engine = RecordingEngine::default();
        let calls = Rc::clone(&engine.calls);
        let mut store = Store::new(&VisualizerConfig::default());
        DroneController::new(engine).attach(&mut store);

        store.set_use_scale_degrees(true);
        store.toggle_detection();
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn rejected_notes_abort_only_that_update() {
        let engine = RecordingEngine { rejects_notes: true, ..RecordingEngine::default() };
        let calls = Rc::clone(&engine.calls);
        let mut store = Store::new(&VisualizerConfig::default());
        DroneController::new(engine).attach(&mut store);

        store.toggle_drone();
        assert!(store.state().drone.is_playing);
        assert_eq!(
            *calls.borrow(),
            vec![Call::Volume(-12.0), Call::ReleaseAll, Call::Trigger(vec!["C3".into()])]
        );

        calls.borrow_mut().clear();
        store.set_drone_volume(-20.0);
        assert_eq!(
            *calls.borrow(),
            vec![Call::Volume(-20.0), Call::ReleaseAll, Call::Trigger(vec!["C3".into()])]
        );
    }
}
