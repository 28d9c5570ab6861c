//! The fixed dependency set shared by the AIVoice example projects.
//!
//! Every example for the Ameba DSP target links against the same prebuilt
//! libraries; only a small per-example override fragment differs. The
//! tables here are the common part, in the exact order the entries must
//! appear in the patched settings file.
//!
//! Two variants exist: the full set links the speech pipeline (AFE
//! resources, VAD, keyword spotting, ASR) with its acoustic models built
//! into the libraries, while the resource-less set leaves those out and
//! flips `USE_BINARY_RESOURCE` so the models are loaded from the
//! filesystem at runtime instead.

use std::path::{Path, PathBuf};

use crate::bts::Entry;

/// Location of the Release build-target settings inside a project
/// directory. Fixed by the IDE's project layout, not configurable.
pub const RELEASE_BTS: &str = ".settings/targets/xtensa/Release.bts";

const INCLUDES_PATH: &str =
    "BuildSettings/BaseSettings/PreprocessorOptions/StringListMapOptions/StringListMapEntry";
const DEFINES_PATH: &str =
    "BuildSettings/BaseSettings/PreprocessorOptions/KeyValueListMapOptions/KeyValueListMapEntry";
const LINKER_PATH: &str =
    "BuildSettings/BaseSettings/LinkerOptions/StringListMapOptions/StringListMapEntry";

/// Which of the two fixed dependency tables to inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencySet {
    /// Everything, including the speech libraries with built-in resources.
    Full,
    /// Without the speech/model libraries; resources load at runtime.
    ResourceLess,
}

const FULL_LIBRARIES: &[&str] = &[
    "aivoice",
    "afe_kernel",
    "kernel",
    "afe_res_2mic50mm",
    "vad",
    "kws",
    "asr",
    "nnns",
    "fst",
    "cJSON",
    "tomlc99",
    "tflite_micro",
    "xa_nnlib",
    "hifi5_dsp",
    "aivoice_hal",
];

const RESOURCE_LESS_LIBRARIES: &[&str] = &[
    "aivoice",
    "afe_kernel",
    "kernel",
    "cJSON",
    "tomlc99",
    "tflite_micro",
    "xa_nnlib",
    "hifi5_dsp",
    "aivoice_hal",
];

const LIBRARY_SEARCH_PATHS: &[&str] = &[
    "${workspace_loc}/../lib/aivoice/prebuilts/ameba_dsp/$(TARGET_CONFIG)",
    "${workspace_loc}/../lib/xa_nnlib/v2.3.0/bin/$(TARGET_CONFIG)/Release",
    "${workspace_loc}/../lib/lib_hifi5/v3.1.0/bin/$(TARGET_CONFIG)",
];

/// The base entries to insert, in insertion order: the shared include path,
/// the libraries, the library search paths, and the `USE_BINARY_RESOURCE`
/// define (`0` for [`DependencySet::Full`], `1` for
/// [`DependencySet::ResourceLess`]).
pub fn base_entries(set: DependencySet) -> Vec<Entry> {
    let libraries = match set {
        DependencySet::Full => FULL_LIBRARIES,
        DependencySet::ResourceLess => RESOURCE_LESS_LIBRARIES,
    };
    let binary_resource = match set {
        DependencySet::Full => "0",
        DependencySet::ResourceLess => "1",
    };

    let mut entries = vec![Entry::text(
        INCLUDES_PATH,
        "Includes",
        "${workspace_loc}/../lib/aivoice/include",
    )];
    entries.extend(
        libraries
            .iter()
            .map(|lib| Entry::text(LINKER_PATH, "Libraries", *lib)),
    );
    entries.extend(
        LIBRARY_SEARCH_PATHS
            .iter()
            .map(|path| Entry::text(LINKER_PATH, "LibrarySearchPath", *path)),
    );
    entries.push(Entry::attrs(
        DEFINES_PATH,
        "Defines",
        &[("key", "USE_BINARY_RESOURCE"), ("value", binary_resource)],
    ));
    entries
}

/// Resolve the Release settings file for a project directory.
pub fn release_bts_path(project_dir: impl AsRef<Path>) -> PathBuf {
    project_dir.as_ref().join(RELEASE_BTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bts::EntryValue;

    fn library_names(entries: &[Entry]) -> Vec<&str> {
        entries
            .iter()
            .filter(|e| e.key == "Libraries")
            .filter_map(|e| match &e.value {
                EntryValue::Text(t) => Some(t.as_str()),
                EntryValue::Attributes(_) => None,
            })
            .collect()
    }

    fn define_value(entries: &[Entry]) -> &str {
        let define = entries.iter().find(|e| e.key == "Defines").unwrap();
        match &define.value {
            EntryValue::Attributes(pairs) => {
                assert_eq!(pairs[0], ("key".to_string(), "USE_BINARY_RESOURCE".to_string()));
                &pairs[1].1
            }
            EntryValue::Text(_) => panic!("Defines entry must carry attributes"),
        }
    }

    #[test]
    fn full_set_links_the_speech_pipeline() {
        let entries = base_entries(DependencySet::Full);
        let libs = library_names(&entries);
        assert_eq!(libs.len(), FULL_LIBRARIES.len());
        for lib in ["kws", "asr", "vad", "afe_res_2mic50mm"] {
            assert!(libs.contains(&lib), "missing {lib}");
        }
        assert_eq!(define_value(&entries), "0");
    }

    #[test]
    fn resource_less_set_drops_the_speech_pipeline() {
        let entries = base_entries(DependencySet::ResourceLess);
        let libs = library_names(&entries);
        for lib in ["kws", "asr", "vad", "afe_res_2mic50mm", "nnns", "fst"] {
            assert!(!libs.contains(&lib), "unexpected {lib}");
        }
        for lib in ["aivoice", "tflite_micro", "hifi5_dsp"] {
            assert!(libs.contains(&lib), "missing {lib}");
        }
        assert_eq!(define_value(&entries), "1");
    }

    #[test]
    fn entries_are_ordered_include_libraries_paths_define() {
        let entries = base_entries(DependencySet::Full);
        assert_eq!(entries.first().unwrap().key, "Includes");
        assert_eq!(entries.last().unwrap().key, "Defines");

        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        let first_path = keys.iter().position(|k| *k == "LibrarySearchPath").unwrap();
        let last_lib = keys.iter().rposition(|k| *k == "Libraries").unwrap();
        assert!(last_lib < first_path, "libraries precede search paths");
    }

    #[test]
    fn both_sets_share_include_and_search_paths() {
        let full = base_entries(DependencySet::Full);
        let reduced = base_entries(DependencySet::ResourceLess);
        let paths = |entries: &[Entry]| -> Vec<Entry> {
            entries
                .iter()
                .filter(|e| e.key == "LibrarySearchPath" || e.key == "Includes")
                .cloned()
                .collect()
        };
        assert_eq!(paths(&full), paths(&reduced));
    }

    #[test]
    fn release_bts_path_is_joined_under_the_project() {
        let path = release_bts_path("/work/example_asr");
        assert_eq!(
            path,
            PathBuf::from("/work/example_asr/.settings/targets/xtensa/Release.bts")
        );
    }
}
