//! User-facing message texts.

use chrono::{NaiveTime, Timelike};

use crate::bot::keyboards;

pub fn welcome() -> String {
    format!(
        "Это бот, позволяющий получить информацию о погоде в Череповце\n\n\
         Этой командой (/start) вам выдаётся клавиатура, \
         на которой расположены основные команды:\n\n\
         *{}* - позволяет получить данные о текущей погоде\n\
         *{}* - позволяет получить прогноз погоды на ближайший час\n\
         *{}* - позволяет получить прогноз погоды в конкретный час, \
         в пределах следующих 12 часов\n\
         *{}* - позволяет получить прогноз погоды на завтра\n\
         *{}* - позволяет получить прогноз погоды в конкретный день, \
         в пределах следующей недели\n\
         *{}* - позволяет узнать о подписке на ежедневный прогноз погоды\n\
         *{}* - поможет разобраться с управлением",
        keyboards::WEATHER,
        keyboards::HOUR_FORECAST,
        keyboards::EXACT_HOUR_FORECAST,
        keyboards::TOMORROW_FORECAST,
        keyboards::EXACT_DAY_FORECAST,
        keyboards::MAILING,
        keyboards::HELP,
    )
}

pub fn info() -> String {
    format!(
        "Бот, позволяющий получить погоду Череповца\n\n\
         Основные функции бота:\n\
         *{}* - получить текущую погоду\n\
         *{}* - получить прогноз погоды на ближайший час\n\
         *{}* - получить прогноз погоды в конкретный час\n\
         *{}* - получить прогноз погоды на завтра\n\
         *{}* - получить прогноз погоды в конкретный день\n\
         *{}* - получить информацию о рассылке\n\n\
         Эти команды расположены на клавиатуре, \
         которую бот выдаёт в ответ на команду /start. \
         Если у вас её нет, то нажмите на эту команду",
        keyboards::WEATHER,
        keyboards::HOUR_FORECAST,
        keyboards::EXACT_HOUR_FORECAST,
        keyboards::TOMORROW_FORECAST,
        keyboards::EXACT_DAY_FORECAST,
        keyboards::MAILING,
    )
}

pub fn user_in_mailing(mailing_time: NaiveTime) -> String {
    format!(
        "Вы зарегистрированы в подписке\n\
         Ваше время - {}:{:02}\n\n\
         Поменять время - /change_time_mailing\n\
         Отказаться от подписки - /cancel_mailing",
        mailing_time.hour(),
        mailing_time.minute(),
    )
}

pub const USER_NOT_IN_MAILING: &str = "Вас нет в подписке\n\n\
     Вы можете подписаться на неё по команде /subscribe_to_mailing";

pub fn user_subscribed(mailing_time: NaiveTime) -> String {
    format!(
        "Вы подписались на рассылку по времени {}:{:02}",
        mailing_time.hour(),
        mailing_time.minute(),
    )
}

pub fn user_changed_mailing_time(mailing_time: NaiveTime) -> String {
    format!(
        "Вы изменили время рассылки на {}:{:02}",
        mailing_time.hour(),
        mailing_time.minute(),
    )
}

pub const USER_UNSUBSCRIBED: &str = "Успешно удалено из подписки";

pub const CHOOSE_HOUR: &str = "Выберите час:";
pub const CHOOSE_MINUTE: &str = "Выберите минуты:";
pub const CHOOSE_FORECAST_HOUR: &str = "Выберите час прогноза:";
pub const CHOOSE_FORECAST_DAY: &str = "Выберите день прогноза:";

pub const MAINTENANCE_MESSAGE: &str =
    "Произошла непредвиденная ошибка. Бригада ремонтников уже в пути!";

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn subscription_times_render_without_leading_zero_hours() {
        let time = NaiveTime::from_hms_opt(7, 5, 0).unwrap();
        assert_eq!(
            user_subscribed(time),
            "Вы подписались на рассылку по времени 7:05"
        );
        assert_eq!(
            user_changed_mailing_time(time),
            "Вы изменили время рассылки на 7:05"
        );
    }

    #[test]
    fn not_in_mailing_text_points_at_the_subscribe_command() {
        assert_eq!(
            USER_NOT_IN_MAILING,
            "Вас нет в подписке\n\nВы можете подписаться на неё по команде /subscribe_to_mailing"
        );
    }

    #[test]
    fn welcome_mentions_every_keyboard_button() {
        let welcome = welcome();
        for button in [
            keyboards::WEATHER,
            keyboards::HOUR_FORECAST,
            keyboards::EXACT_HOUR_FORECAST,
            keyboards::TOMORROW_FORECAST,
            keyboards::EXACT_DAY_FORECAST,
            keyboards::MAILING,
            keyboards::HELP,
        ] {
            assert!(welcome.contains(button));
        }
    }
}
