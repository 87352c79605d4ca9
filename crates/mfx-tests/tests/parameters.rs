use std::ffi::CStr;

use mfx_host::ffi::{cstr, kOfxParamPropDisplayMax, kOfxParamPropMax, kOfxParamPropMin, kOfxStatFailed};
use mfx_host::suites::VARIADIC_SUPPORTED;
use mfx_host::{
    ActionError, Host, MessageType, NoHooks, ParameterType, ParameterValue, PersistentMessage,
    PluginRegistryManager, PluginStatus, StatusCode,
};
use mfx_tests::{stage_bundle, MeshData, MeshFixture, TEST_PARAMETERS};
use pretty_assertions::assert_eq;

const TEST_PARAMETERS_INDEX: usize = 0;
const FAILING_LOAD_INDEX: usize = 1;
const FAILING_COOK_INDEX: usize = 2;

fn manager() -> PluginRegistryManager {
    PluginRegistryManager::new(Host::new(MeshFixture::new(MeshData::triangle())))
}

fn set(instance: &mut mfx_host::MeshEffect, name: &CStr, value: ParameterValue) {
    instance
        .parameters_mut()
        .find_mut(name)
        .expect("parameter exists")
        .set_value(value)
        .unwrap();
}

#[test]
fn bundle_exports_three_plugins() {
    let (_dir, bundle) = stage_bundle(TEST_PARAMETERS).unwrap();
    let manager = manager();
    let registry = manager.get_registry(&bundle).expect("open bundle");
    let identifiers: Vec<_> = registry.plugins().iter().map(|p| p.identifier()).collect();
    assert_eq!(identifiers, vec!["TestParameters", "FailingLoad", "FailingCook"]);
    manager.release_registry(&bundle);
}

#[test]
fn describe_defines_every_parameter_type_with_defaults() {
    let (_dir, bundle) = stage_bundle(TEST_PARAMETERS).unwrap();
    let manager = manager();
    manager.get_registry(&bundle).expect("open bundle");
    let descriptor = manager
        .get_effect_descriptor(&bundle, TEST_PARAMETERS_INDEX)
        .expect("describe");

    let kinds: Vec<_> = descriptor
        .parameters()
        .iter()
        .map(|param| (param.name().to_string_lossy().into_owned(), param.parameter_type()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("Count".to_string(), ParameterType::Integer),
            ("Count2D".to_string(), ParameterType::Integer2D),
            ("Count3D".to_string(), ParameterType::Integer3D),
            ("Distance".to_string(), ParameterType::Double),
            ("Vector2D".to_string(), ParameterType::Double2D),
            ("Vector3D".to_string(), ParameterType::Double3D),
            ("Color".to_string(), ParameterType::Rgb),
            ("RGBA Color".to_string(), ParameterType::Rgba),
            ("Enable Option".to_string(), ParameterType::Boolean),
            ("Description".to_string(), ParameterType::String),
        ]
    );

    let distance = descriptor.parameters().find(cstr!("Distance")).unwrap();
    assert_eq!(distance.properties().double(kOfxParamPropMin, 0), Some(-10.0));
    assert_eq!(distance.properties().double(kOfxParamPropMax, 0), Some(110.0));
    assert_eq!(distance.properties().double(kOfxParamPropDisplayMax, 0), Some(100.0));

    let host = manager.host();
    let instance = host.create_instance(&descriptor).unwrap();
    let value = |name: &CStr| instance.parameters().find(name).unwrap().value();
    assert_eq!(value(cstr!("Count")), ParameterValue::Integer(15));
    assert_eq!(value(cstr!("Count3D")), ParameterValue::Integer3D([12, 45, 1569]));
    assert_eq!(value(cstr!("Vector2D")), ParameterValue::Double2D([12.89, 1.02369]));
    assert_eq!(value(cstr!("RGBA Color")), ParameterValue::Rgba([0.72, 0.058068, 0.14, 0.5]));
    assert_eq!(value(cstr!("Enable Option")), ParameterValue::Boolean(true));
    assert_eq!(
        value(cstr!("Description")),
        ParameterValue::String("Description here!".into())
    );
    host.destroy_instance(instance);
    manager.release_registry(&bundle);
}

#[test]
fn cook_reads_parameters_and_the_input() {
    if !VARIADIC_SUPPORTED {
        eprintln!("variadic suite calls are not supported on this target; skipping");
        return;
    }
    let (_dir, bundle) = stage_bundle(TEST_PARAMETERS).unwrap();
    let manager = manager();
    manager.get_registry(&bundle).expect("open bundle");
    let descriptor = manager
        .get_effect_descriptor(&bundle, TEST_PARAMETERS_INDEX)
        .expect("describe");

    let host = manager.host();
    let mut instance = host.create_instance(&descriptor).unwrap();
    host.cook(&mut instance).unwrap();
    assert_eq!(
        instance.persistent_message(),
        Some(&PersistentMessage {
            kind: MessageType::Message,
            text: "read 10 parameters, Count is 15, input has 3 points".into(),
        })
    );

    set(&mut instance, cstr!("Count"), ParameterValue::Integer(42));
    host.cook(&mut instance).unwrap();
    assert_eq!(
        instance.persistent_message().map(|message| message.text.as_str()),
        Some("read 10 parameters, Count is 42, input has 3 points")
    );

    host.destroy_instance(instance);
    manager.release_registry(&bundle);
}

#[test]
fn disabled_option_leaves_a_warning() {
    if !VARIADIC_SUPPORTED {
        eprintln!("variadic suite calls are not supported on this target; skipping");
        return;
    }
    let (_dir, bundle) = stage_bundle(TEST_PARAMETERS).unwrap();
    let manager = manager();
    manager.get_registry(&bundle).expect("open bundle");
    let descriptor = manager
        .get_effect_descriptor(&bundle, TEST_PARAMETERS_INDEX)
        .expect("describe");

    let host = manager.host();
    let mut instance = host.create_instance(&descriptor).unwrap();
    set(&mut instance, cstr!("Enable Option"), ParameterValue::Boolean(false));
    host.cook(&mut instance).unwrap();
    assert_eq!(
        instance.persistent_message(),
        Some(&PersistentMessage {
            kind: MessageType::Warning,
            text: "option disabled".into(),
        })
    );
    host.destroy_instance(instance);
    manager.release_registry(&bundle);
}

#[test]
fn failed_load_disables_the_plugin() {
    let (_dir, bundle) = stage_bundle(TEST_PARAMETERS).unwrap();
    let manager = PluginRegistryManager::new(Host::new(NoHooks));
    let registry = manager.get_registry(&bundle).expect("open bundle");
    let plugin = registry.plugin(FAILING_LOAD_INDEX).unwrap();

    match manager.host().load_plugin(plugin) {
        Err(ActionError::Rejected { plugin, action, status }) => {
            assert_eq!(plugin, "FailingLoad");
            assert_eq!(action, "Load");
            assert_eq!(status, StatusCode(kOfxStatFailed));
        }
        other => panic!("expected a rejected load, got {other:?}"),
    }
    assert_eq!(plugin.status(), PluginStatus::Error);
    assert!(matches!(
        manager.host().load_plugin(plugin),
        Err(ActionError::PluginDisabled(name)) if name == "FailingLoad"
    ));
    assert!(manager
        .get_effect_descriptor(&bundle, FAILING_LOAD_INDEX)
        .is_none());

    // The other plug-ins of the bundle are unaffected.
    assert!(manager
        .get_effect_descriptor(&bundle, FAILING_COOK_INDEX)
        .is_some());
    manager.release_registry(&bundle);
}

#[test]
fn default_reply_to_cook_is_a_protocol_violation() {
    let (_dir, bundle) = stage_bundle(TEST_PARAMETERS).unwrap();
    let manager = manager();
    manager.get_registry(&bundle).expect("open bundle");
    let descriptor = manager
        .get_effect_descriptor(&bundle, FAILING_COOK_INDEX)
        .expect("describe");

    let host = manager.host();
    let mut instance = host.create_instance(&descriptor).unwrap();
    let err = host.cook(&mut instance).unwrap_err();
    assert!(matches!(
        err,
        ActionError::ProtocolViolation { ref plugin, action: "Cook", .. } if plugin == "FailingCook"
    ));
    host.destroy_instance(instance);
    manager.release_registry(&bundle);
}
