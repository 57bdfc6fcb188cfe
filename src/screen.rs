use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Screen {
    #[default]
    Home,
    Create,
    Grab,
    Leaderboard,
}

/// Things that move the user between screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    OpenCreate,
    OpenGrab,
    OpenLeaderboard,
    Back,
    /// A red packet finished creating.
    Submitted,
    /// The grab result was shown and dismissed.
    GrabAcknowledged,
}

impl Screen {
    /// Where `nav` leads from here, or `None` if that move is not allowed.
    pub fn transition(self, nav: Nav) -> Option<Screen> {
        match (self, nav) {
            (Screen::Home, Nav::OpenCreate) => Some(Screen::Create),
            (Screen::Home, Nav::OpenGrab) => Some(Screen::Grab),
            (Screen::Home, Nav::OpenLeaderboard) => Some(Screen::Leaderboard),
            (Screen::Create, Nav::Back | Nav::Submitted) => Some(Screen::Home),
            (Screen::Grab, Nav::Back) => Some(Screen::Home),
            (Screen::Grab, Nav::GrabAcknowledged) => Some(Screen::Leaderboard),
            (Screen::Leaderboard, Nav::Back) => Some(Screen::Home),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Home => "赛博红包",
            Screen::Create => "创建红包",
            Screen::Grab => "抢红包",
            Screen::Leaderboard => "排行榜",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            Screen::Home => "未来世界的红包抢夺游戏",
            Screen::Create => "设置你的赛博红包参数",
            Screen::Grab => "选择一个红包来抢夺奖励",
            Screen::Leaderboard => "赛博世界的顶级玩家",
        }
    }
}

/// The three entries of the home menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HomeAction {
    #[default]
    Create,
    Grab,
    Leaderboard,
}

impl HomeAction {
    pub const ALL: [HomeAction; 3] = [HomeAction::Create, HomeAction::Grab, HomeAction::Leaderboard];

    pub fn next(self) -> Self {
        match self {
            HomeAction::Create => HomeAction::Grab,
            HomeAction::Grab => HomeAction::Leaderboard,
            HomeAction::Leaderboard => HomeAction::Create,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            HomeAction::Create => HomeAction::Leaderboard,
            HomeAction::Grab => HomeAction::Create,
            HomeAction::Leaderboard => HomeAction::Grab,
        }
    }

    pub fn nav(self) -> Nav {
        match self {
            HomeAction::Create => Nav::OpenCreate,
            HomeAction::Grab => Nav::OpenGrab,
            HomeAction::Leaderboard => Nav::OpenLeaderboard,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HomeAction::Create => "发红包",
            HomeAction::Grab => "抢红包",
            HomeAction::Leaderboard => "排行榜",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            HomeAction::Create => "创建属于你的赛博红包",
            HomeAction::Grab => "抢夺其他玩家的红包奖励",
            HomeAction::Leaderboard => "查看赛博世界的顶级玩家",
        }
    }
}
