//! Linker and archiver flags.
//!
//! Paths named by settings are relative to the build file. They pass through
//! the caller's resolver so the backend decides how they appear on the command
//! line.

use super::{ConfigView, SettingsError, XcodeSettings};

/// Linker options whose single operand is a file.
const FILE_OPERAND_FLAGS: [&str; 3] = [
    "-exported_symbols_list",
    "-unexported_symbols_list",
    "-reexported_symbols_list",
];

impl XcodeSettings<'_> {
    /// Linker flags for `configuration`.
    ///
    /// `product_dir` is added as a library search path and every path taken
    /// from the settings is rewritten with `resolve_path`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ConfigurationNotFound`] for unknown names.
    pub fn get_ldflags<F>(
        &self,
        configuration: &str,
        product_dir: &str,
        resolve_path: F,
        arch: Option<&str>,
    ) -> Result<Vec<String>, SettingsError>
    where
        F: Fn(&str) -> String,
    {
        let view = self.view(configuration)?;
        let mut flags = rewrite_other_ldflags(view.list("OTHER_LDFLAGS"), &resolve_path);

        view.push_if_yes(&mut flags, "DEAD_CODE_STRIPPING", false, "-Wl,-dead_strip");
        view.push_if_yes(&mut flags, "PREBINDING", false, "-Wl,-prebind");
        push_versioned(&view, &mut flags, "DYLIB_COMPATIBILITY_VERSION", "-compatibility_version");
        push_versioned(&view, &mut flags, "DYLIB_CURRENT_VERSION", "-current_version");

        view.push_deployment_target(&mut flags);
        view.push_sysroot(&mut flags);

        flags.extend(
            view.list("LIBRARY_SEARCH_PATHS")
                .iter()
                .map(|path| format!("-L{}", resolve_path(path))),
        );

        if let Some(order_file) = view.text("ORDER_FILE") {
            flags.push("-Wl,-order_file".to_owned());
            flags.push(format!("-Wl,{}", resolve_path(&order_file)));
        }

        if !self.cross_compiling
            && let Some(selected) = self.arch_for(&view, arch)
        {
            flags.push("-arch".to_owned());
            flags.push(selected);
        }

        let resolved_product_dir = resolve_path(product_dir);
        if resolved_product_dir == "." {
            flags.push("-L./".to_owned());
        } else {
            flags.push(format!("-L{resolved_product_dir}"));
        }

        if let Some(install_name) = self.install_name(configuration)? {
            flags.push("-install_name".to_owned());
            flags.push(install_name);
        }

        flags.extend(
            view.list("LD_RUNPATH_SEARCH_PATHS")
                .iter()
                .map(|path| format!("-Wl,-rpath,{path}")),
        );

        view.push_framework_dirs(&mut flags);
        Ok(flags)
    }

    /// Flags for `libtool` when archiving static libraries.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ConfigurationNotFound`] for unknown names.
    pub fn get_libtool_flags(&self, configuration: &str) -> Result<Vec<String>, SettingsError> {
        Ok(self.view(configuration)?.list("OTHER_LDFLAGS"))
    }
}

fn push_versioned(view: &ConfigView<'_>, flags: &mut Vec<String>, key: &str, flag: &str) {
    if let Some(version) = view.text(key) {
        flags.push(flag.to_owned());
        flags.push(version.into_owned());
    }
}

/// Rewrite file operands inside `OTHER_LDFLAGS` through `resolve_path`.
fn rewrite_other_ldflags<F>(tokens: Vec<String>, resolve_path: &F) -> Vec<String>
where
    F: Fn(&str) -> String,
{
    let mut rewritten = Vec::with_capacity(tokens.len());
    let mut pending_file_operands = 0_usize;
    let mut pending_sectcreate_skip = 0_usize;
    for token in tokens {
        if pending_sectcreate_skip > 0 {
            pending_sectcreate_skip -= 1;
            rewritten.push(token);
            continue;
        }
        if pending_file_operands > 0 {
            pending_file_operands -= 1;
            rewritten.push(resolve_path(&token));
            continue;
        }
        if FILE_OPERAND_FLAGS.contains(&token.as_str()) {
            pending_file_operands = 1;
            rewritten.push(token);
        } else if token == "-sectcreate" {
            pending_sectcreate_skip = 2;
            pending_file_operands = 1;
            rewritten.push(token);
        } else if token == "-L" {
            pending_file_operands = 1;
            rewritten.push(token);
        } else if let Some(path) = token.strip_prefix("-L") {
            rewritten.push(format!("-L{}", resolve_path(path)));
        } else if let Some(linker_args) = token.strip_prefix("-Wl,") {
            rewritten.push(rewrite_linker_passthrough(linker_args, resolve_path));
        } else {
            rewritten.push(token);
        }
    }
    rewritten
}

/// Rewrite the file operand of a `-Wl,` comma list.
fn rewrite_linker_passthrough<F>(linker_args: &str, resolve_path: &F) -> String
where
    F: Fn(&str) -> String,
{
    let mut parts: Vec<String> = linker_args.split(',').map(str::to_owned).collect();
    let file_index = match parts.first().map(String::as_str) {
        Some(flag) if FILE_OPERAND_FLAGS.contains(&flag) => Some(1),
        Some("-sectcreate") => Some(3),
        _ => None,
    };
    if let Some(index) = file_index
        && let Some(operand) = parts.get_mut(index)
    {
        *operand = resolve_path(operand);
    }
    format!("-Wl,{}", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Configuration, TargetSpec, TargetType};
    use rstest::rstest;

    fn identity(path: &str) -> String {
        path.to_owned()
    }

    fn prefixed(path: &str) -> String {
        format!("../src/{path}")
    }

    fn spec_with(target_type: TargetType, settings: &[(&str, &str)]) -> TargetSpec {
        TargetSpec::new("wee", target_type).with_configuration(
            "Release",
            Configuration::with_xcode_settings(settings.iter().copied()),
        )
    }

    #[test]
    fn defaults_for_static_library() {
        let spec = spec_with(TargetType::StaticLibrary, &[]);
        let flags = XcodeSettings::new(&spec)
            .get_ldflags("Release", "PRODUCT_DIR", identity, Some("arm64"))
            .expect("ldflags");
        assert_eq!(flags, ["-arch", "arm64", "-LPRODUCT_DIR"]);
    }

    #[test]
    fn current_directory_product_dir_keeps_a_separator() {
        let spec = spec_with(TargetType::StaticLibrary, &[]);
        let flags = XcodeSettings::new(&spec)
            .with_cross_compile(true)
            .get_ldflags("Release", ".", identity, None)
            .expect("ldflags");
        assert_eq!(flags, ["-L./"]);
    }

    #[test]
    fn shared_library_flags_in_order() {
        let spec = spec_with(
            TargetType::SharedLibrary,
            &[
                ("OTHER_LDFLAGS", "-lz -exported_symbols_list exports.txt"),
                ("DEAD_CODE_STRIPPING", "YES"),
                ("DYLIB_CURRENT_VERSION", "1.2.3"),
                ("MACOSX_DEPLOYMENT_TARGET", "11.0"),
                ("LIBRARY_SEARCH_PATHS", "vendor/lib"),
                ("ORDER_FILE", "order.txt"),
                ("LD_RUNPATH_SEARCH_PATHS", "@loader_path"),
            ],
        );
        let flags = XcodeSettings::new(&spec)
            .get_ldflags("Release", "out", prefixed, Some("arm64"))
            .expect("ldflags");
        assert_eq!(
            flags,
            [
                "-lz",
                "-exported_symbols_list",
                "../src/exports.txt",
                "-Wl,-dead_strip",
                "-current_version",
                "1.2.3",
                "-mmacosx-version-min=11.0",
                "-L../src/vendor/lib",
                "-Wl,-order_file",
                "-Wl,../src/order.txt",
                "-arch",
                "arm64",
                "-L../src/out",
                "-install_name",
                "/usr/local/lib/libwee.dylib",
                "-Wl,-rpath,@loader_path",
            ]
        );
    }

    #[rstest]
    #[case(&["-Lthird_party"], &["-L../src/third_party"])]
    #[case(&["-L", "third_party"], &["-L", "../src/third_party"])]
    #[case(&["-Wl,-unexported_symbols_list,hidden.txt"], &["-Wl,-unexported_symbols_list,../src/hidden.txt"])]
    #[case(
        &["-sectcreate", "__TEXT", "__info_plist", "Info.plist"],
        &["-sectcreate", "__TEXT", "__info_plist", "../src/Info.plist"]
    )]
    #[case(&["-Wl,-sectcreate,__TEXT,__info,Info.plist"], &["-Wl,-sectcreate,__TEXT,__info,../src/Info.plist"])]
    #[case(&["-framework", "Cocoa"], &["-framework", "Cocoa"])]
    fn other_ldflags_file_operands_are_resolved(
        #[case] input: &[&str],
        #[case] expected: &[&str],
    ) {
        let tokens = input.iter().map(|token| (*token).to_owned()).collect();
        assert_eq!(rewrite_other_ldflags(tokens, &prefixed), expected);
    }

    #[test]
    fn libtool_flags_are_other_ldflags_verbatim() {
        let spec = spec_with(TargetType::StaticLibrary, &[("OTHER_LDFLAGS", "-no_warning_for_no_symbols")]);
        let flags = XcodeSettings::new(&spec)
            .get_libtool_flags("Release")
            .expect("libtool flags");
        assert_eq!(flags, ["-no_warning_for_no_symbols"]);
    }
}
