//! Ninja backend helpers: output file naming and compilation database queries.

mod compdb;
mod naming;
mod paths;

pub use compdb::{
    COMPDB_RULES, CompileCommand, CompileDbError, NINJA_PROGRAM, generate_compile_db_with,
    generate_compile_db_with_ninja, resolve_ninja_program,
};
pub use naming::{NamingError, compute_output_file_name};
