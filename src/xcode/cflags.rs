//! Compiler flags.

use std::borrow::Cow;

use tracing::warn;

use super::{ConfigView, SettingsError, XcodeSettings};

/// Optimisation level Xcode applies when `GCC_OPTIMIZATION_LEVEL` is unset.
fn default_optimization_level(configuration: &str) -> &'static str {
    if configuration == "Debug" { "0" } else { "s" }
}

/// Architectures that accept the SSE switches.
fn is_intel(arch: &str) -> bool {
    matches!(arch, "i386" | "x86_64")
}

const SSE_SETTINGS: [(&str, &str); 4] = [
    ("GCC_ENABLE_SSE3_EXTENSIONS", "-msse3"),
    ("GCC_ENABLE_SUPPLEMENTAL_SSE3_INSTRUCTIONS", "-mssse3"),
    ("GCC_ENABLE_SSE41_EXTENSIONS", "-msse4.1"),
    ("GCC_ENABLE_SSE42_EXTENSIONS", "-msse4.2"),
];

impl XcodeSettings<'_> {
    /// Flags shared by every source language of `configuration`.
    ///
    /// `arch` selects the `-arch` value; when `None` the first active
    /// architecture is used. No `-arch` is emitted when cross-compiling.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ConfigurationNotFound`] for unknown names and
    /// [`SettingsError::UnsupportedDebugFormat`] for debug formats without a
    /// compiler switch.
    pub fn get_cflags(
        &self,
        configuration: &str,
        arch: Option<&str>,
    ) -> Result<Vec<String>, SettingsError> {
        let view = self.view(configuration)?;
        let mut flags = Vec::new();

        view.push_sysroot(&mut flags);
        view.push_if_yes(
            &mut flags,
            "CLANG_WARN_CONSTANT_CONVERSION",
            false,
            "-Wconstant-conversion",
        );
        view.push_if_yes(&mut flags, "GCC_CHAR_IS_UNSIGNED_CHAR", false, "-funsigned-char");
        view.push_if_yes(&mut flags, "GCC_CW_ASM_SYNTAX", true, "-fasm-blocks");
        view.push_if_yes(&mut flags, "GCC_DYNAMIC_NO_PIC", false, "-mdynamic-no-pic");
        view.push_if_yes(&mut flags, "GCC_ENABLE_PASCAL_STRINGS", true, "-mpascal-strings");

        let level = view
            .text("GCC_OPTIMIZATION_LEVEL")
            .unwrap_or_else(|| Cow::Borrowed(default_optimization_level(view.name)));
        flags.push(format!("-O{level}"));

        push_debug_format(&view, &mut flags)?;

        match view.text("GCC_STRICT_ALIASING").as_deref() {
            Some("YES") => flags.push("-fstrict-aliasing".to_owned()),
            Some("NO") => flags.push("-fno-strict-aliasing".to_owned()),
            _ => {}
        }

        view.push_if_yes(
            &mut flags,
            "GCC_SYMBOLS_PRIVATE_EXTERN",
            false,
            "-fvisibility=hidden",
        );
        view.push_if_yes(&mut flags, "GCC_TREAT_WARNINGS_AS_ERRORS", false, "-Werror");
        view.push_if_yes(
            &mut flags,
            "GCC_WARN_ABOUT_MISSING_NEWLINE",
            false,
            "-Wnewline-eof",
        );
        view.push_if_yes(&mut flags, "LLVM_LTO", false, "-flto");

        view.push_deployment_target(&mut flags);

        if !self.cross_compiling
            && let Some(selected) = self.arch_for(&view, arch)
        {
            if is_intel(&selected) {
                for (key, flag) in SSE_SETTINGS {
                    view.push_if_yes(&mut flags, key, false, flag);
                }
            }
            flags.push("-arch".to_owned());
            flags.push(selected);
        }

        flags.extend(view.list("WARNING_CFLAGS"));
        view.push_framework_dirs(&mut flags);
        Ok(flags)
    }

    /// C-only flags: language standard, then `OTHER_CFLAGS`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ConfigurationNotFound`] for unknown names.
    pub fn get_cflags_c(&self, configuration: &str) -> Result<Vec<String>, SettingsError> {
        let view = self.view(configuration)?;
        let mut flags = Vec::new();
        match view.text("GCC_C_LANGUAGE_STANDARD").as_deref() {
            Some("ansi") => flags.push("-ansi".to_owned()),
            Some(standard) => flags.push(format!("-std={standard}")),
            None => {}
        }
        flags.extend(view.list("OTHER_CFLAGS"));
        Ok(flags)
    }

    /// C++-only flags.
    ///
    /// `OTHER_CPLUSPLUSFLAGS` defaults to `$(inherited)`, and both that and
    /// `$(OTHER_CFLAGS)` expand to the configuration's `OTHER_CFLAGS`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ConfigurationNotFound`] for unknown names.
    pub fn get_cflags_cc(&self, configuration: &str) -> Result<Vec<String>, SettingsError> {
        let view = self.view(configuration)?;
        let mut flags = Vec::new();
        if let Some(standard) = view.text("CLANG_CXX_LANGUAGE_STANDARD") {
            flags.push(format!("-std={standard}"));
        }
        if let Some(library) = view.text("CLANG_CXX_LIBRARY") {
            flags.push(format!("-stdlib={library}"));
        }
        push_if_no(&view, &mut flags, "GCC_ENABLE_CPP_RTTI", "-fno-rtti");
        push_if_no(&view, &mut flags, "GCC_ENABLE_CPP_EXCEPTIONS", "-fno-exceptions");
        view.push_if_yes(
            &mut flags,
            "GCC_INLINES_ARE_PRIVATE_EXTERN",
            false,
            "-fvisibility-inlines-hidden",
        );
        push_if_no(
            &view,
            &mut flags,
            "GCC_THREADSAFE_STATICS",
            "-fno-threadsafe-statics",
        );
        push_if_no(
            &view,
            &mut flags,
            "GCC_WARN_ABOUT_INVALID_OFFSETOF_MACRO",
            "-Wno-invalid-offsetof",
        );

        let other = if view.get("OTHER_CPLUSPLUSFLAGS").is_some() {
            view.list("OTHER_CPLUSPLUSFLAGS")
        } else {
            vec!["$(inherited)".to_owned()]
        };
        for flag in other {
            if is_inherited_cflags(&flag) {
                flags.extend(view.list("OTHER_CFLAGS"));
            } else {
                flags.push(flag);
            }
        }
        Ok(flags)
    }

    /// Objective-C-only flags.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ConfigurationNotFound`] for unknown names.
    pub fn get_cflags_objc(&self, configuration: &str) -> Result<Vec<String>, SettingsError> {
        let view = self.view(configuration)?;
        let mut flags = Vec::new();
        push_objc_flags(&view, &mut flags);
        Ok(flags)
    }

    /// Objective-C++-only flags: the Objective-C flags plus C++ object
    /// construction.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ConfigurationNotFound`] for unknown names.
    pub fn get_cflags_objcc(&self, configuration: &str) -> Result<Vec<String>, SettingsError> {
        let view = self.view(configuration)?;
        let mut flags = Vec::new();
        push_objc_flags(&view, &mut flags);
        view.push_if_yes(
            &mut flags,
            "GCC_OBJC_CALL_CXX_CDTORS",
            false,
            "-fobjc-call-cxx-cdtors",
        );
        Ok(flags)
    }
}

fn push_debug_format(view: &ConfigView<'_>, flags: &mut Vec<String>) -> Result<(), SettingsError> {
    if !view.is_yes("GCC_GENERATE_DEBUGGING_SYMBOLS", true) {
        return Ok(());
    }
    let format = view.text_or("DEBUG_INFORMATION_FORMAT", "dwarf");
    match format.as_ref() {
        "dwarf" | "dwarf-with-dsym" => {
            flags.push("-gdwarf-2".to_owned());
            Ok(())
        }
        other => Err(SettingsError::UnsupportedDebugFormat {
            configuration: view.name.to_owned(),
            format: other.to_owned(),
        }),
    }
}

fn push_if_no(view: &ConfigView<'_>, flags: &mut Vec<String>, key: &str, flag: &str) {
    if view.text(key).as_deref() == Some("NO") {
        flags.push(flag.to_owned());
    }
}

fn push_objc_flags(view: &ConfigView<'_>, flags: &mut Vec<String>) {
    match view.text("GCC_ENABLE_OBJC_GC").as_deref() {
        Some("supported") => flags.push("-fobjc-gc".to_owned()),
        Some("required") => flags.push("-fobjc-gc-only".to_owned()),
        Some("unsupported") | None => {}
        Some(other) => warn!(value = other, "ignoring unknown GCC_ENABLE_OBJC_GC value"),
    }
    view.push_if_yes(flags, "CLANG_ENABLE_OBJC_ARC", false, "-fobjc-arc");
    view.push_if_yes(flags, "CLANG_ENABLE_OBJC_WEAK", false, "-fobjc-weak");
    view.push_if_yes(
        flags,
        "CLANG_WARN_OBJC_MISSING_PROPERTY_SYNTHESIS",
        false,
        "-Wobjc-missing-property-synthesis",
    );
}

fn is_inherited_cflags(flag: &str) -> bool {
    matches!(
        flag,
        "$inherited"
            | "$(inherited)"
            | "${inherited}"
            | "$OTHER_CFLAGS"
            | "$(OTHER_CFLAGS)"
            | "${OTHER_CFLAGS}"
    )
}
