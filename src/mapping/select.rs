use crate::core::{CrudError, Result};
use crate::shape::Callable;

/// Picks the constructor or method to run.
///
/// With a `requested` name only candidates of that name are considered and
/// one of them must fit. Without one, the fitting candidate with the most
/// parameters wins, and `Ok(None)` means nothing fits. Two winners with the
/// same parameter count are ambiguous.
pub(crate) fn select<'a, C, F>(
    entity: &str,
    candidates: &'a [C],
    requested: Option<&str>,
    fits: F,
) -> Result<Option<&'a C>>
where
    C: Callable,
    F: Fn(&[&'static str]) -> bool,
{
    let named: Vec<&C> = candidates
        .iter()
        .filter(|c| requested.is_none_or(|name| c.name() == name))
        .collect();

    if let Some(name) = requested {
        if named.is_empty() {
            return Err(CrudError::MethodNotFound {
                entity: entity.to_string(),
                method: name.to_string(),
            });
        }
    }

    let mut fitting: Vec<&C> = named.into_iter().filter(|c| fits(c.params())).collect();
    fitting.sort_by(|a, b| b.params().len().cmp(&a.params().len()));

    match fitting.as_slice() {
        [] => match requested {
            Some(name) => Err(CrudError::MethodNotFound {
                entity: entity.to_string(),
                method: name.to_string(),
            }),
            None => Ok(None),
        },
        [best, rest @ ..] => {
            let tied: Vec<&str> = rest
                .iter()
                .filter(|c| c.params().len() == best.params().len())
                .map(|c| c.name())
                .collect();
            if tied.is_empty() {
                Ok(Some(*best))
            } else {
                let mut names = vec![best.name()];
                names.extend(tied);
                Err(CrudError::AmbiguousMethod {
                    entity: entity.to_string(),
                    candidates: names.join(", "),
                })
            }
        }
    }
}
