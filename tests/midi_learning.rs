//! MIDI learning and dispatch through the event bus

use technocoid::messaging::{EventBus, Notification, NotificationKind};
use technocoid::midi::{
    DispatchOutcome, LearnMode, MidiDispatcher, MidiEvent, MidiEventType, MidiMessage,
};

fn cc(channel: u8, controller: u8, value: u8) -> MidiMessage {
    MidiMessage::ControlChange {
        channel,
        controller,
        value,
    }
}

#[test]
fn test_learn_opacity_then_receive() {
    let bus = EventBus::new();
    let events = bus.subscribe(&[
        NotificationKind::MidiEventLearned,
        NotificationKind::MidiEventReceived,
    ]);
    let dispatcher = MidiDispatcher::new(bus);
    let opacity = MidiEventType::TrackOpacity(0);

    dispatcher.begin_learning(opacity);

    // A note while learning a ranged control is ignored
    let outcome = dispatcher.on_raw_message(MidiMessage::NoteOn {
        channel: 1,
        note: 60,
        velocity: 100,
    });
    assert_eq!(outcome, DispatchOutcome::Ignored);
    assert_eq!(dispatcher.mode(), LearnMode::Learning(opacity));
    assert!(events.drain().is_empty());

    assert_eq!(
        dispatcher.on_raw_message(cc(1, 7, 64)),
        DispatchOutcome::Learned(opacity)
    );
    assert_eq!(dispatcher.mode(), LearnMode::Idle);
    assert_eq!(dispatcher.table().get(opacity).unwrap().binding.id, 7);
    assert_eq!(
        events.drain(),
        vec![Notification::MidiEventLearned(opacity)]
    );

    assert_eq!(
        dispatcher.on_raw_message(cc(1, 7, 100)),
        DispatchOutcome::Dispatched(1)
    );
    assert_eq!(
        events.drain(),
        vec![Notification::MidiEventReceived(MidiEvent {
            event_type: opacity,
            value: 100,
        })]
    );
}

#[test]
fn test_learned_message_is_not_dispatched() {
    let bus = EventBus::new();
    let received = bus.subscribe(&[NotificationKind::MidiEventReceived]);
    let dispatcher = MidiDispatcher::new(bus);

    dispatcher.begin_learning(MidiEventType::Bpm);
    dispatcher.on_raw_message(cc(1, 30, 50));
    assert!(received.drain().is_empty());
}

#[test]
fn test_matching_ignores_channel() {
    let bus = EventBus::new();
    let received = bus.subscribe(&[NotificationKind::MidiEventReceived]);
    let dispatcher = MidiDispatcher::new(bus);

    dispatcher.begin_learning(MidiEventType::Bpm);
    dispatcher.on_raw_message(cc(1, 30, 0));

    dispatcher.on_raw_message(cc(10, 30, 90));
    assert_eq!(received.drain().len(), 1);
}

#[test]
fn test_learn_notification_via_bus() {
    let bus = EventBus::new();
    let requests = bus.subscribe(&[NotificationKind::LearnMidiEvent]);
    let dispatcher = MidiDispatcher::new(bus.clone());

    bus.publish(Notification::LearnMidiEvent(MidiEventType::SlotToggle(5)));
    for notification in requests.drain() {
        dispatcher.handle(&notification);
    }
    assert_eq!(
        dispatcher.mode(),
        LearnMode::Learning(MidiEventType::SlotToggle(5))
    );

    bus.publish(Notification::LearnMidiEvent(MidiEventType::Empty));
    for notification in requests.drain() {
        dispatcher.handle(&notification);
    }
    assert_eq!(dispatcher.mode(), LearnMode::Idle);
}

#[test]
fn test_note_and_controller_with_same_id_stay_apart() {
    let bus = EventBus::new();
    let received = bus.subscribe(&[NotificationKind::MidiEventReceived]);
    let dispatcher = MidiDispatcher::new(bus);

    dispatcher.begin_learning(MidiEventType::TrackPlaybackRate(1));
    dispatcher.on_raw_message(cc(1, 40, 0));
    dispatcher.begin_learning(MidiEventType::Rewind);
    dispatcher.on_raw_message(MidiMessage::NoteOn {
        channel: 1,
        note: 40,
        velocity: 1,
    });

    dispatcher.on_raw_message(MidiMessage::NoteOn {
        channel: 1,
        note: 40,
        velocity: 127,
    });
    assert_eq!(
        received.drain(),
        vec![Notification::MidiEventReceived(MidiEvent {
            event_type: MidiEventType::Rewind,
            value: 40,
        })]
    );
}

#[test]
fn test_dispatch_from_another_thread() {
    let bus = EventBus::new();
    let received = bus.subscribe(&[NotificationKind::MidiEventReceived]);
    let dispatcher = std::sync::Arc::new(MidiDispatcher::new(bus));

    dispatcher.begin_learning(MidiEventType::TapTempo);
    dispatcher.on_raw_message(MidiMessage::NoteOn {
        channel: 2,
        note: 50,
        velocity: 10,
    });

    let midi_thread = {
        let dispatcher = std::sync::Arc::clone(&dispatcher);
        std::thread::spawn(move || {
            for _ in 0..10 {
                dispatcher.on_raw_message(MidiMessage::NoteOn {
                    channel: 2,
                    note: 50,
                    velocity: 10,
                });
            }
        })
    };
    midi_thread.join().unwrap();

    assert_eq!(received.drain().len(), 10);
}
