use thiserror::Error;

use crate::ir::{InstId, IrType};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The optimization passes themselves never fail: a missed opportunity is reported as
/// "unchanged", not as an error. Errors come from building or verifying an instruction graph
/// and from the pass plumbing around it.
///
/// # Error Categories
///
/// ## Graph Construction Errors
/// - [`Error::TypeMismatch`] - Operand type does not fit the operation being built
/// - [`Error::InvalidValue`] - A value reference is out of range for its function
///
/// ## Graph Consistency Errors
/// - [`Error::Malformed`] - The instruction graph violates a structural invariant
/// - [`Error::UnknownInstruction`] - An instruction id does not name a live instruction
///
/// ## Pipeline Errors
/// - [`Error::MissingEntryPoint`] - A module has no entry function to run on
///
/// # Examples
///
/// ```rust
/// use shadelower::{Error, ir::{FunctionBuilder, IrType, Value}};
///
/// let mut builder = FunctionBuilder::new("main", &[IrType::F32, IrType::F64], IrType::VOID);
/// match builder.fadd(Value::Arg(0), Value::Arg(1)) {
///     Err(Error::TypeMismatch { expected, found }) => {
///         eprintln!("expected {expected}, found {found}");
///     }
///     Err(e) => eprintln!("Other error: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The instruction graph is damaged.
    ///
    /// Reported by [`crate::ir::Function::verify`] when use lists, operand references
    /// or block membership disagree with each other. The error includes the source
    /// location where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An operand has a different type than the operation requires.
    #[error("Type mismatch - expected {expected}, found {found}")]
    TypeMismatch {
        /// The type the operation required
        expected: IrType,
        /// The type that was supplied
        found: IrType,
    },

    /// A value reference cannot be resolved in its function.
    ///
    /// Typically an argument index beyond the parameter list or a reference to
    /// an instruction that has already been erased.
    #[error("Invalid value - {0}")]
    InvalidValue(String),

    /// The instruction id does not refer to a live instruction.
    #[error("Unknown instruction - {0}")]
    UnknownInstruction(InstId),

    /// The module does not have an entry-point function.
    #[error("Module has no entry point")]
    MissingEntryPoint,

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
