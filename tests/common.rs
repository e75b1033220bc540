#![allow(dead_code)]

use dialogue_engine::{
    AudioCoordinator, Engine, MemorySlotStore, NullBackend, SaveCoordinator, StoryRaw,
};

/// Two-scene story exercising auto-advance, choices with and without
/// responses, flags, and a terminal node. Most nodes type instantly so
/// transition tests stay direct; scene002 node "1" types at normal speed
/// for the typewriter tests.
pub fn sample_story_json() -> &'static str {
    r#"{
        "scenes": {
            "scene001": {
                "title": "Welcome to Iran",
                "location_id": "apartment",
                "character_id": "alex",
                "bgm": "main_theme",
                "dialog": {
                    "0": {
                        "speaker": "narrator",
                        "english": "You wake up in your new apartment.",
                        "farsi": "شما در آپارتمان جدید خود بیدار می‌شوید.",
                        "typing_speed": "instant",
                        "default_next_id": "1"
                    },
                    "1": {
                        "speaker": "alex",
                        "english": "Oh, you're up! Good morning!",
                        "farsi": "بیدار شدی؟ صبح بخیر!",
                        "typing_speed": "instant",
                        "choices": [
                            {
                                "english": "Good morning. You must be Alex?",
                                "farsi": "صبح بخیر. شما باید الکس باشید؟",
                                "response": {
                                    "speaker": "alex",
                                    "english": "That's right! I'm Alex.",
                                    "farsi": "بله، درسته! من الکس هستم.",
                                    "typing_speed": "instant"
                                },
                                "next_id": "2",
                                "set_flags": { "polite": { "bool": true } }
                            },
                            {
                                "english": "Hello.",
                                "farsi": "سلام.",
                                "next_id": "3"
                            }
                        ]
                    },
                    "2": {
                        "speaker": "alex",
                        "english": "Come on, let me show you around.",
                        "farsi": "بیا، اطراف رو نشونت بدم.",
                        "typing_speed": "instant",
                        "default_next_id": "3"
                    },
                    "3": {
                        "speaker": "alex",
                        "english": "The language school is close.",
                        "farsi": "مدرسه زبان نزدیکه.",
                        "typing_speed": "instant",
                        "choices": [
                            {
                                "english": "Can you show me the way?",
                                "farsi": "می‌تونی راه رو نشونم بدی؟",
                                "next_scene_id": "scene002"
                            },
                            {
                                "english": "I'll find it on my own.",
                                "farsi": "خودم پیداش می‌کنم.",
                                "next_scene_id": "scene002"
                            }
                        ]
                    }
                }
            },
            "scene002": {
                "title": "The Language School",
                "location_id": "school_exterior",
                "character_id": "teacher",
                "bgm": "street_ambience",
                "dialog": {
                    "0": {
                        "speaker": "teacher",
                        "english": "Welcome! You must be the new student.",
                        "farsi": "خوش آمدید! شما باید دانش‌آموز جدید باشید.",
                        "typing_speed": "instant",
                        "default_next_id": "1"
                    },
                    "1": {
                        "speaker": "teacher",
                        "english": "Class starts soon.",
                        "farsi": "کلاس به زودی شروع می‌شود."
                    }
                }
            }
        },
        "characters": {
            "alex": { "english": "Alex Thompson", "farsi": "الکس تامپسون" },
            "teacher": { "english": "Dr. Fatima Ahmadi", "farsi": "دکتر فاطمه احمدی" }
        }
    }"#
}

/// A headless engine over a strict-compiled story, with the audio gate
/// already opened.
pub fn engine_for(json: &str) -> Engine<NullBackend, MemorySlotStore> {
    let _ = env_logger::builder().is_test(true).try_init();
    let story = StoryRaw::from_json(json)
        .expect("parse story")
        .compile()
        .expect("compile story");
    let mut engine = Engine::new(
        story,
        AudioCoordinator::new(NullBackend),
        SaveCoordinator::new(MemorySlotStore::default()),
    );
    engine.notify_interaction();
    engine
}

pub fn sample_engine() -> Engine<NullBackend, MemorySlotStore> {
    engine_for(sample_story_json())
}
