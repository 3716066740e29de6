use thiserror::Error;

/// Ошибки поля выбора. Ни одна не выходит за пределы компонента:
/// они хранятся в состоянии и выводятся под полем ввода.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    /// GET списка вариантов не удался (сеть или не-2xx)
    #[error("Failed to load options: {0}")]
    Fetch(String),
    /// POST создания варианта не удался; введённый текст сохраняется
    #[error("{0}")]
    Create(String),
    /// Обязательное поле осталось пустым после ухода фокуса
    #[error("{0} is required")]
    Required(String),
}
