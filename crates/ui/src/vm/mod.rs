mod participant_vm;

pub use participant_vm::{
    LOW_TIME_SECS, OptionVm, ParticipantScreenVm, QuestionVm, ResultRowVm, ResultsVm, Screen,
    TimerVm, format_timer, map_participant_screen,
};
