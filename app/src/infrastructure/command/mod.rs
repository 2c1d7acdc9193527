mod shell;

pub use self::shell::TokioShellRunner;
