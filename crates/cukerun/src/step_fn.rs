//! Conversion of closures into type-erased step actions.
//!
//! A step body is a closure taking `&mut W` followed by any number (up to
//! six) of arguments implementing [`FromStr`]. Bodies that also want the
//! step's table or doc string take a trailing `&MultilineArgument`
//! parameter and are registered through the `*_with_argument` methods.
//! Either kind may return `()` or `Result<(), E>` with `E: Into<StepError>`.

use crate::error::StepError;
use crate::feature::MultilineArgument;
use std::fmt::Display;
use std::str::FromStr;

/// Type-erased step body.
pub type StepAction<W> = Box<dyn Fn(&mut W, StepArgs<'_>) -> Result<(), StepError>>;

/// Number of parameters a step body declares after the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many, counting a trailing multiline parameter.
    Exact(usize),
    /// Any number; the body inspects [`StepArgs`] itself.
    Variadic,
}

impl Arity {
    /// Declared parameter count; `None` for variadic bodies.
    #[must_use]
    pub fn declared(self) -> Option<usize> {
        match self {
            Self::Exact(expected) => Some(expected),
            Self::Variadic => None,
        }
    }

    /// Whether `supplied` arguments satisfy this arity.
    #[must_use]
    pub fn accepts(self, supplied: usize) -> bool {
        self.declared().is_none_or(|expected| expected == supplied)
    }
}

/// Arguments handed to a step body.
#[derive(Debug)]
pub struct StepArgs<'a> {
    values: Vec<Option<String>>,
    multiline: Option<&'a MultilineArgument>,
    cursor: usize,
}

impl<'a> StepArgs<'a> {
    pub(crate) fn new(values: Vec<Option<String>>, multiline: Option<&'a MultilineArgument>) -> Self {
        Self {
            values,
            multiline,
            cursor: 0,
        }
    }

    /// Captured values after argument transforms, `None` for groups that did
    /// not participate.
    #[must_use]
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// The step's table or doc string.
    #[must_use]
    pub fn multiline(&self) -> Option<&'a MultilineArgument> {
        self.multiline
    }

    /// Convert the next captured value. A non-participating group converts
    /// from the empty string.
    ///
    /// # Errors
    /// Returns [`StepError::InvalidArgument`] when conversion fails or no
    /// values remain.
    pub fn next_parsed<T>(&mut self) -> Result<T, StepError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let index = self.cursor;
        self.cursor += 1;
        let Some(raw) = self.values.get(index) else {
            return Err(StepError::InvalidArgument {
                index,
                value: String::new(),
                reason: "no captured value".into(),
            });
        };
        let text = raw.as_deref().unwrap_or_default();
        text.parse().map_err(|err: T::Err| StepError::InvalidArgument {
            index,
            value: text.to_owned(),
            reason: err.to_string(),
        })
    }

    fn require_multiline(&self) -> Result<&'a MultilineArgument, StepError> {
        self.multiline
            .ok_or_else(|| StepError::failed("step has no table or doc string"))
    }
}

/// Return values a step body may produce.
pub trait IntoStepResult {
    /// Normalise into a step outcome.
    ///
    /// # Errors
    /// Propagates the body's failure.
    fn into_step_result(self) -> Result<(), StepError>;
}

impl IntoStepResult for () {
    fn into_step_result(self) -> Result<(), StepError> {
        Ok(())
    }
}

impl<E: Into<StepError>> IntoStepResult for Result<(), E> {
    fn into_step_result(self) -> Result<(), StepError> {
        self.map_err(Into::into)
    }
}

/// Closures usable as step bodies; `Args` is inferred from the closure's
/// parameter types.
pub trait IntoStepFn<W, Args> {
    /// Declared parameter count after the world.
    fn arity(&self) -> usize;
    /// Erase the closure's type.
    fn into_action(self) -> StepAction<W>;
}

/// Closures usable as step bodies that take a trailing multiline argument.
pub trait IntoStepFnWithArgument<W, Args> {
    /// Declared parameter count after the world, including the multiline
    /// parameter.
    fn arity(&self) -> usize;
    /// Erase the closure's type.
    fn into_action(self) -> StepAction<W>;
}

macro_rules! impl_step_fns {
    ($count:expr; $($ty:ident $var:ident),*) => {
        impl<W, F, R, $($ty,)*> IntoStepFn<W, ($($ty,)*)> for F
        where
            F: Fn(&mut W, $($ty),*) -> R + 'static,
            R: IntoStepResult,
            $($ty: FromStr, <$ty as FromStr>::Err: Display,)*
        {
            fn arity(&self) -> usize {
                $count
            }

            fn into_action(self) -> StepAction<W> {
                Box::new(move |world, mut args| {
                    $(let $var = args.next_parsed::<$ty>()?;)*
                    let _ = &mut args;
                    self(world, $($var),*).into_step_result()
                })
            }
        }

        impl<W, F, R, $($ty,)*> IntoStepFnWithArgument<W, ($($ty,)*)> for F
        where
            F: Fn(&mut W, $($ty,)* &MultilineArgument) -> R + 'static,
            R: IntoStepResult,
            $($ty: FromStr, <$ty as FromStr>::Err: Display,)*
        {
            fn arity(&self) -> usize {
                $count + 1
            }

            fn into_action(self) -> StepAction<W> {
                Box::new(move |world, mut args| {
                    $(let $var = args.next_parsed::<$ty>()?;)*
                    let _ = &mut args;
                    let multiline = args.require_multiline()?;
                    self(world, $($var,)* multiline).into_step_result()
                })
            }
        }
    };
}

impl_step_fns!(0;);
impl_step_fns!(1; A1 a1);
impl_step_fns!(2; A1 a1, A2 a2);
impl_step_fns!(3; A1 a1, A2 a2, A3 a3);
impl_step_fns!(4; A1 a1, A2 a2, A3 a3, A4 a4);
impl_step_fns!(5; A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_step_fns!(6; A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);

/// Erase a body that inspects its arguments itself.
pub(crate) fn variadic<W, F, R>(body: F) -> StepAction<W>
where
    F: Fn(&mut W, &StepArgs<'_>) -> R + 'static,
    R: IntoStepResult,
{
    Box::new(move |world, args| body(world, &args).into_step_result())
}
