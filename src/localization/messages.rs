/// supported languages for the bootstrap screens
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    En,
    Ru,
}

impl Lang {
    /// creates Lang from Telegram's language_code (e.g., "ru", "en", "uk")
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.split(['-', '_']).next().unwrap_or(c)) {
            Some("ru") => Lang::Ru,
            _ => Lang::En,
        }
    }
}

// =============================================================================
// Status screens
// =============================================================================

impl Lang {
    pub fn loading_title(&self) -> &'static str {
        match self {
            Lang::En => "⏳ Loading",
            Lang::Ru => "⏳ Загрузка",
        }
    }

    pub fn loading_body(&self) -> &'static str {
        match self {
            Lang::En => "Checking your Telegram account...",
            Lang::Ru => "Проверяем ваш аккаунт Telegram...",
        }
    }

    pub fn not_in_host_title(&self) -> &'static str {
        match self {
            Lang::En => "📱 Open in Telegram",
            Lang::Ru => "📱 Откройте в Telegram",
        }
    }

    pub fn not_in_host_body(&self) -> &'static str {
        match self {
            Lang::En => "This app works only inside Telegram. Please open it from the bot's menu button.",
            Lang::Ru => "Это приложение работает только внутри Telegram. Откройте его через кнопку меню бота.",
        }
    }

    pub fn validated_title(&self) -> &'static str {
        match self {
            Lang::En => "✅ Signed in",
            Lang::Ru => "✅ Вход выполнен",
        }
    }

    pub fn welcome(&self, name: &str) -> String {
        match self {
            Lang::En => format!("Welcome, {}!", name),
            Lang::Ru => format!("Добро пожаловать, {}!", name),
        }
    }
}

// =============================================================================
// Error screens
// =============================================================================

impl Lang {
    pub fn auth_failed_title(&self) -> &'static str {
        match self {
            Lang::En => "❌ Authentication failed",
            Lang::Ru => "❌ Ошибка авторизации",
        }
    }

    pub fn auth_failed_body(&self) -> &'static str {
        match self {
            Lang::En => "We couldn't confirm your Telegram account. Please try again.",
            Lang::Ru => "Не удалось подтвердить ваш аккаунт Telegram. Попробуйте снова.",
        }
    }

    pub fn error_title(&self) -> &'static str {
        match self {
            Lang::En => "⚠️ Something went wrong",
            Lang::Ru => "⚠️ Что-то пошло не так",
        }
    }

    pub fn error_body(&self) -> &'static str {
        match self {
            Lang::En => "Authentication failed due to an error. Please retry.",
            Lang::Ru => "Авторизация не удалась из-за ошибки. Повторите попытку.",
        }
    }

    pub fn unverified_notice(&self, name: &str) -> String {
        match self {
            Lang::En => format!("Development mode: unverified user {}", name),
            Lang::Ru => format!("Режим разработки: непроверенный пользователь {}", name),
        }
    }

    pub fn retry_button(&self) -> &'static str {
        match self {
            Lang::En => "🔄 Retry",
            Lang::Ru => "🔄 Повторить",
        }
    }
}
