/// *** Structs to help get/set global configuration parameters that are read from the config files. *** //
///
/// This implementation of Settings allows inserting a setting of 4 different
/// types (string, bool, f64, and i32) without needing to call a specific
/// function for each type.
///
/// To insert a new parameter into SETTINGS:
///     SETTINGS.insert(SYSTEM, "fps", fps);
/// To get a parameter from SETTINGS:
///     let fps = SETTINGS.get::<f64>(SYSTEM, "fps");

use std::{collections::HashMap, sync::RwLock};

use lazy_static::lazy_static;
use linked_hash_map::LinkedHashMap;
use log::info;

use std::fs::File;
use std::io::Read;
use yaml_rust::yaml;
use yaml_rust::yaml::Yaml;

pub static SYSTEM: &str = "SYSTEM";
pub static CAMERA: &str = "CAMERA";

//* GLOBAL SETTING PARAMETERS FOR LOOKUP */
pub struct Settings {
    // Lock is necessary because Settings is a static variable
    settings: RwLock<HashMap<String, SettingBox>>,
}

lazy_static! {
    pub static ref SETTINGS: Settings = Settings {
        settings: RwLock::new(HashMap::new())
    };
}

impl Settings {
    pub fn get<T>(&self, module: &str, param: &str) -> T
    where Self: OverloadedSetting<T> {
        let key = format!("{}_{}", module, param);
        let unlocked_params = SETTINGS.settings.read().unwrap();
        let boxed_value = unlocked_params
            .get(&key)
            .unwrap_or_else(|| panic!("Missing setting {}", key));
        self.get_value_from_box(boxed_value)
    }

    pub fn insert<T: std::fmt::Debug>(&self, namespace: &str, key_param: &str, value: T)
    where Self: OverloadedSetting<T> {
        let key = format!("{}_{}", namespace, key_param);
        let value = self.make_box_from_value(value);
        let mut unlocked_params = SETTINGS.settings.write().unwrap();
        unlocked_params.insert(key, value);
    }
}

impl OverloadedSetting<String> for Settings {
    fn get_value_from_box(&self, boxed_value: &SettingBox) -> String {
        boxed_value.string_field.as_ref().unwrap().to_string()
    }
    fn make_box_from_value(&self, value: String) -> SettingBox {
        SettingBox { string_field: Some(value), ..Default::default() }
    }
}

impl OverloadedSetting<bool> for Settings {
    fn get_value_from_box(&self, boxed_value: &SettingBox) -> bool {
        *boxed_value.bool_field.as_ref().unwrap()
    }
    fn make_box_from_value(&self, value: bool) -> SettingBox {
        SettingBox { bool_field: Some(value), ..Default::default() }
    }
}

impl OverloadedSetting<f64> for Settings {
    fn get_value_from_box(&self, boxed_value: &SettingBox) -> f64 {
        *boxed_value.float_field.as_ref().unwrap()
    }
    fn make_box_from_value(&self, value: f64) -> SettingBox {
        SettingBox { float_field: Some(value), ..Default::default() }
    }
}

impl OverloadedSetting<i32> for Settings {
    fn get_value_from_box(&self, boxed_value: &SettingBox) -> i32 {
        *boxed_value.int_field.as_ref().unwrap()
    }
    fn make_box_from_value(&self, value: i32) -> SettingBox {
        SettingBox { int_field: Some(value), ..Default::default() }
    }
}

pub trait OverloadedSetting<T> {
    fn get_value_from_box(&self, boxed_value: &SettingBox) -> T;
    fn make_box_from_value(&self, value: T) -> SettingBox;
}

#[derive(Default)]
pub struct SettingBox {
    string_field: Option<String>,
    bool_field: Option<bool>,
    float_field: Option<f64>,
    int_field: Option<i32>,
}

/// Rig geometry and pacing, snapshotted out of SETTINGS once at launch so
/// the threads never touch the global store.
#[derive(Debug, Clone)]
pub struct RigConf {
    pub width: u32,
    pub height: u32,
    pub frame_rate_profile: String,
}

impl RigConf {
    pub fn from_settings() -> RigConf {
        RigConf {
            width: SETTINGS.get::<i32>(CAMERA, "width") as u32,
            height: SETTINGS.get::<i32>(CAMERA, "height") as u32,
            frame_rate_profile: SETTINGS.get::<String>(CAMERA, "frame_rate_profile"),
        }
    }
}

// * LOADING CONFIGURATION FROM FILE *//

#[derive(Debug, Default, Clone)]
// Struct holding configuration for one collaborator module.
pub struct ModuleConf {
    // Splitting up names and tags lets the rest of the system refer to a
    // module by name without being tied to a specific implementation: the
    // orchestrator asks for GRABBER without knowing whether that is the
    // dataset reader or the synthetic generator.
    pub name: String, // How this module is referred to by the rest of the system
    pub tag: String,  // Tag to match up with an implementation in registered_modules.rs
}

pub fn load_config(system_fn: &str, camera_fn: &str) -> Result<(Vec<ModuleConf>, String), Box<dyn std::error::Error>> {
    info!("Configs... System: {}, Camera: {}", system_fn, camera_fn);

    let (module_info, log_level) = load_system_settings(system_fn)?;
    load_camera_settings(camera_fn)?;

    Ok((module_info, log_level))
}

fn load_system_settings(system_fn: &str) -> Result<(Vec<ModuleConf>, String), Box<dyn std::error::Error>> {
    let mut config_string = String::new();
    let mut f = File::open(system_fn)?;
    f.read_to_string(&mut config_string)?;
    let yaml_document = &yaml::YamlLoader::load_from_str(&config_string)?[0];

    info!("SYSTEM SETTINGS");

    let system_settings = &yaml_document["system"];
    add_setting_string(SYSTEM, "results_folder", &system_settings["results_folder"]);
    add_setting_string(SYSTEM, "trajectory_file_name", &system_settings["trajectory_file_name"]);
    add_setting_string(SYSTEM, "scene_config", &system_settings["scene_config"]);
    add_setting_f64(SYSTEM, "fps", &system_settings["fps"]);
    add_setting_bool(SYSTEM, "show_visualizer", &system_settings["show_visualizer"]);
    let log_level = system_settings["log_level"].as_str().unwrap_or("info").to_owned();

    // Load collaborator modules
    let mut module_info = Vec::<ModuleConf>::new();
    for module in yaml_document["modules"].as_vec().ok_or("No modules section in system config")? {
        let h = module.as_hash().ok_or("Malformed module entry")?;
        let m_conf = ModuleConf {
            name: get_val(h, "name").as_str().ok_or("Module missing name")?.to_string(),
            tag: get_val(h, "tag").as_str().ok_or("Module missing tag")?.to_string(),
        };

        SETTINGS.insert(&m_conf.name, "module_tag", m_conf.tag.clone());

        if let Some(settings) = get_val(h, "settings").as_vec() {
            add_settings(settings, &m_conf.name);
        }
        module_info.push(m_conf);
    }

    Ok((module_info, log_level))
}

fn load_camera_settings(camera_fn: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut config_string = String::new();
    let mut f = File::open(camera_fn)?;
    f.read_to_string(&mut config_string)?;

    info!("CAMERA SETTINGS");

    let yaml_document = &yaml::YamlLoader::load_from_str(&config_string)?[0];
    add_setting_i32(CAMERA, "width", &yaml_document["width"]);
    add_setting_i32(CAMERA, "height", &yaml_document["height"]);
    add_setting_string(CAMERA, "frame_rate_profile", &yaml_document["frame_rate_profile"]);
    add_setting_f64(CAMERA, "fx", &yaml_document["fx"]);
    add_setting_f64(CAMERA, "fy", &yaml_document["fy"]);
    add_setting_f64(CAMERA, "cx", &yaml_document["cx"]);
    add_setting_f64(CAMERA, "cy", &yaml_document["cy"]);
    add_setting_f64(CAMERA, "baseline", &yaml_document["baseline"]);

    Ok(())
}

fn add_settings(settings: &[Yaml], namespace: &str) -> Option<()> {
    for setting in settings {
        let setting = setting.as_hash()?;
        let s_name = setting[&Yaml::String("name".to_string())].as_str()?.to_string();
        let s_value = &setting[&Yaml::String("value".to_string())];
        let s_type = setting[&Yaml::String("type".to_string())].as_str()?.to_string();

        match s_type.as_ref() {
            "bool" => add_setting_bool(namespace, &s_name, s_value),
            "i32" => add_setting_i32(namespace, &s_name, s_value),
            "f64" => add_setting_f64(namespace, &s_name, s_value),
            "string" => add_setting_string(namespace, &s_name, s_value),
            _ => panic!("Incompatible type {} for setting {} in {}", s_type, s_name, namespace),
        };
    }
    Some(())
}

fn add_setting_bool(namespace: &str, key: &str, value: &Yaml) {
    let val = value.as_bool().unwrap();
    SETTINGS.insert(namespace, key, val);
    info!("\t {} {} = {}", namespace, key, val);
}
fn add_setting_i32(namespace: &str, key: &str, value: &Yaml) {
    let val = value.as_i64().unwrap() as i32;
    SETTINGS.insert(namespace, key, val);
    info!("\t {} {} = {}", namespace, key, val);
}
fn add_setting_f64(namespace: &str, key: &str, value: &Yaml) {
    let val = value.as_f64().unwrap();
    SETTINGS.insert(namespace, key, val);
    info!("\t {} {} = {}", namespace, key, val);
}
fn add_setting_string(namespace: &str, key: &str, value: &Yaml) {
    let val = value.as_str().unwrap().to_string();
    SETTINGS.insert(namespace, key, val.clone());
    info!("\t {} {} = {}", namespace, key, val);
}
fn get_val<'a>(hashmap: &'a LinkedHashMap<Yaml, Yaml>, string: &str) -> &'a Yaml {
    &hashmap[&Yaml::String(string.to_string())]
}
