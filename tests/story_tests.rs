mod common;

use common::sample_story_json;
use dialogue_engine::{Continuation, StoryRaw, VnError};

fn compile_err(json: &str) -> String {
    let story = StoryRaw::from_json(json).expect("parse story");
    match story.compile() {
        Err(VnError::InvalidStory(message)) => message,
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn valid_story_compiles() {
    let story = StoryRaw::from_json(sample_story_json()).unwrap();
    let compiled = story.compile().unwrap();

    let scene = compiled.scene("scene001").unwrap();
    assert_eq!(&*scene.entry, "0");
    assert_eq!(&*scene.title, "Welcome to Iran");
    assert_eq!(scene.bgm.as_deref(), Some("main_theme"));
    assert_eq!(scene.nodes.len(), 4);

    let node = compiled.node("scene001", "1").unwrap();
    match &node.continuation {
        Continuation::Branch { choices } => assert_eq!(choices.len(), 2),
        other => panic!("expected branch, got {other:?}"),
    }
    assert!(matches!(
        compiled.node("scene002", "1").unwrap().continuation,
        Continuation::Terminal
    ));
    assert_eq!(
        compiled.display_name("alex", dialogue_engine::Language::English),
        Some("Alex Thompson")
    );
}

#[test]
fn every_broken_reference_is_reported_at_once() {
    let json = r#"{
        "scenes": {
            "scene001": {
                "title": "Broken",
                "location_id": "apartment",
                "character_id": "alex",
                "dialog": {
                    "0": {
                        "speaker": "alex",
                        "english": "One.",
                        "farsi": "یک.",
                        "default_next_id": "99"
                    },
                    "1": {
                        "speaker": "alex",
                        "english": "Two.",
                        "farsi": "دو.",
                        "next_scene_id": "scene404"
                    }
                }
            }
        }
    }"#;
    let message = compile_err(json);
    assert!(message.contains("default_next_id '99' not found"), "{message}");
    assert!(message.contains("next_scene_id 'scene404' not found"), "{message}");
}

#[test]
fn choice_targets_are_validated_too() {
    let json = r#"{
        "scenes": {
            "scene001": {
                "title": "Broken choices",
                "location_id": "apartment",
                "character_id": "alex",
                "dialog": {
                    "0": {
                        "speaker": "alex",
                        "english": "Pick.",
                        "farsi": "انتخاب کن.",
                        "choices": [
                            { "english": "A", "farsi": "الف", "next_id": "nowhere" },
                            { "english": "B", "farsi": "ب", "next_scene_id": "scene404" }
                        ]
                    }
                }
            }
        }
    }"#;
    let message = compile_err(json);
    assert!(message.contains("choice 0: next_id 'nowhere' not found"), "{message}");
    assert!(
        message.contains("choice 1: next_scene_id 'scene404' not found"),
        "{message}"
    );
}

#[test]
fn multiple_continuation_mechanisms_are_rejected() {
    let json = r#"{
        "scenes": {
            "scene001": {
                "title": "Ambiguous",
                "location_id": "apartment",
                "character_id": "alex",
                "dialog": {
                    "0": {
                        "speaker": "alex",
                        "english": "Which way?",
                        "farsi": "کدوم طرف؟",
                        "default_next_id": "1",
                        "next_scene_id": "scene001"
                    },
                    "1": {
                        "speaker": "alex",
                        "english": "End.",
                        "farsi": "پایان."
                    }
                }
            }
        }
    }"#;
    let message = compile_err(json);
    assert!(
        message.contains("more than one continuation mechanism"),
        "{message}"
    );
}

#[test]
fn choice_without_a_target_is_rejected() {
    let json = r#"{
        "scenes": {
            "scene001": {
                "title": "No target",
                "location_id": "apartment",
                "character_id": "alex",
                "dialog": {
                    "0": {
                        "speaker": "alex",
                        "english": "Pick.",
                        "farsi": "انتخاب کن.",
                        "choices": [
                            { "english": "A", "farsi": "الف" }
                        ]
                    }
                }
            }
        }
    }"#;
    let message = compile_err(json);
    assert!(message.contains("no continuation target"), "{message}");
}

#[test]
fn choice_with_both_targets_is_rejected() {
    let json = r#"{
        "scenes": {
            "scene001": {
                "title": "Both targets",
                "location_id": "apartment",
                "character_id": "alex",
                "dialog": {
                    "0": {
                        "speaker": "alex",
                        "english": "Pick.",
                        "farsi": "انتخاب کن.",
                        "choices": [
                            {
                                "english": "A",
                                "farsi": "الف",
                                "next_id": "0",
                                "next_scene_id": "scene001"
                            }
                        ]
                    }
                }
            }
        }
    }"#;
    let message = compile_err(json);
    assert!(
        message.contains("both next_id and next_scene_id"),
        "{message}"
    );
}

#[test]
fn missing_entry_node_is_rejected() {
    let json = r#"{
        "scenes": {
            "scene001": {
                "title": "No entry",
                "location_id": "apartment",
                "character_id": "alex",
                "entry": "start",
                "dialog": {
                    "0": {
                        "speaker": "alex",
                        "english": "Hi.",
                        "farsi": "سلام."
                    }
                }
            }
        }
    }"#;
    let message = compile_err(json);
    assert!(message.contains("entry node 'start' not found"), "{message}");
}

#[test]
fn empty_choice_list_is_rejected() {
    let json = r#"{
        "scenes": {
            "scene001": {
                "title": "Empty branch",
                "location_id": "apartment",
                "character_id": "alex",
                "dialog": {
                    "0": {
                        "speaker": "alex",
                        "english": "Dead end.",
                        "farsi": "بن‌بست.",
                        "choices": []
                    }
                }
            }
        }
    }"#;
    let message = compile_err(json);
    assert!(message.contains("empty choice list"), "{message}");
}

#[test]
fn story_round_trips_through_json() {
    let story = StoryRaw::from_json(sample_story_json()).unwrap();
    let serialized = story.to_json().unwrap();
    let reparsed = StoryRaw::from_json(&serialized).unwrap();

    assert_eq!(
        reparsed.schema_version.as_deref(),
        Some(dialogue_engine::STORY_SCHEMA_VERSION)
    );
    assert_eq!(reparsed.scenes.len(), story.scenes.len());
    assert_eq!(
        reparsed.scenes["scene001"].dialog.len(),
        story.scenes["scene001"].dialog.len()
    );
    // The reparsed story still passes strict validation.
    reparsed.compile().unwrap();
}

#[test]
fn incompatible_schema_version_is_rejected() {
    let json = r#"{ "schema_version": "9.9", "scenes": {} }"#;
    match StoryRaw::from_json(json) {
        Err(VnError::InvalidStory(message)) => {
            assert!(message.contains("schema incompatible"), "{message}");
        }
        other => panic!("expected schema rejection, got {other:?}"),
    }
}

#[test]
fn entry_defaults_to_node_zero() {
    let story = StoryRaw::from_json(sample_story_json()).unwrap();
    assert_eq!(story.scenes["scene002"].entry, "0");
}
