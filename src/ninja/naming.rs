//! Output file naming per flavor.

use miette::Diagnostic;
use thiserror::Error;

use crate::spec::{TargetSpec, TargetType};
use crate::toolchain::Flavor;

/// Errors raised when a target's output name cannot be derived.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum NamingError {
    /// The target type has no naming convention.
    #[error("unhandled output type `{target_type}` for target `{target}`")]
    #[diagnostic(
        code(shikumi::ninja::unhandled_type),
        help(
            "use executable, shared_library, static_library, loadable_module or none"
        )
    )]
    UnhandledType {
        /// Target being named.
        target: String,
        /// The rejected type name.
        target_type: String,
    },
}

/// Prefix and extension conventions of one flavor.
struct Conventions {
    executable_suffix: &'static str,
    static_prefix: &'static str,
    static_suffix: &'static str,
    shared_prefix: &'static str,
    shared_suffix: &'static str,
}

impl Conventions {
    const fn for_flavor(flavor: &Flavor) -> Self {
        match flavor {
            Flavor::Win => Self {
                executable_suffix: ".exe",
                static_prefix: "",
                static_suffix: ".lib",
                shared_prefix: "",
                shared_suffix: ".dll",
            },
            Flavor::Mac => Self {
                executable_suffix: "",
                static_prefix: "lib",
                static_suffix: ".a",
                shared_prefix: "lib",
                shared_suffix: ".dylib",
            },
            _ => Self {
                executable_suffix: "",
                static_prefix: "lib",
                static_suffix: ".a",
                shared_prefix: "lib",
                shared_suffix: ".so",
            },
        }
    }
}

/// File name of the product `spec` builds as `target_type` on `flavor`.
///
/// The platform prefix is not doubled when `target_name` already starts with
/// it, and `product_prefix`, `product_extension` and `product_name` override
/// the derived parts. Targets of type `none` produce a `.stamp` file.
///
/// ```
/// use shikumi::ninja::compute_output_file_name;
/// use shikumi::spec::{TargetSpec, TargetType};
/// use shikumi::toolchain::Flavor;
///
/// let spec = TargetSpec::new("wee", TargetType::SharedLibrary);
/// let name = compute_output_file_name(&spec, &spec.target_type, &Flavor::Linux)?;
/// assert_eq!(name, "libwee.so");
/// # Ok::<(), shikumi::ninja::NamingError>(())
/// ```
///
/// # Errors
///
/// Returns [`NamingError::UnhandledType`] for types without a convention.
pub fn compute_output_file_name(
    spec: &TargetSpec,
    target_type: &TargetType,
    flavor: &Flavor,
) -> Result<String, NamingError> {
    let conventions = Conventions::for_flavor(flavor);
    let (default_prefix, default_suffix) = match target_type {
        TargetType::Executable => ("", conventions.executable_suffix),
        TargetType::StaticLibrary => (conventions.static_prefix, conventions.static_suffix),
        TargetType::SharedLibrary | TargetType::LoadableModule => {
            (conventions.shared_prefix, conventions.shared_suffix)
        }
        TargetType::None => {
            let name = spec.product_name.as_ref().unwrap_or(&spec.target_name);
            return Ok(format!("{name}.stamp"));
        }
        TargetType::Other(other) => {
            return Err(NamingError::UnhandledType {
                target: spec.target_name.clone(),
                target_type: other.clone(),
            });
        }
    };

    let stripped = if default_prefix == "lib" {
        spec.target_name
            .strip_prefix("lib")
            .unwrap_or(&spec.target_name)
    } else {
        &spec.target_name
    };
    let prefix = spec.product_prefix.as_deref().unwrap_or(default_prefix);
    let name = spec.product_name.as_deref().unwrap_or(stripped);
    let suffix = spec
        .product_extension
        .as_deref()
        .map_or_else(|| default_suffix.to_owned(), |ext| format!(".{ext}"));
    Ok(format!("{prefix}{name}{suffix}"))
}
